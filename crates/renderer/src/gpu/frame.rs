use tracing::warn;

use super::contour::ContourStage;
use super::noise::NoiseStage;
use super::shaders::StageShader;
use super::uniforms::ScaleOffsetUniform;
use crate::scheduler::FrameParams;
use crate::surface::SurfaceSize;

/// Both stages wired together, independent of where the frame is presented.
pub struct FramePipeline {
    noise: NoiseStage,
    contour: ContourStage,
}

impl FramePipeline {
    pub fn new(
        device: &wgpu::Device,
        noise_shader: &StageShader,
        contour_shader: &StageShader,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            noise: NoiseStage::new(device, noise_shader),
            contour: ContourStage::new(device, contour_shader, output_format),
        }
    }

    pub fn noise(&self) -> &NoiseStage {
        &self.noise
    }

    /// Records one frame drawing into `destination` and queues both uniform
    /// writes. The writes land before the returned buffer runs as long as it
    /// is submitted on the same `queue`.
    pub fn encode_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        destination: &wgpu::Texture,
        size: SurfaceSize,
        params: &FrameParams,
    ) -> wgpu::CommandBuffer {
        let handle = self.noise.update_render_target(device, size);
        match self.noise.target_view(handle) {
            Some(view) => self.contour.set_input_texture(device, view),
            None => warn!(generation = handle.generation, "noise target handle is stale"),
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });
        // The contour pass samples what the noise pass just wrote.
        self.noise.render_pass(&mut encoder);
        self.contour.render_pass(&mut encoder, destination);

        self.noise
            .update_uniform_buffer(queue, ScaleOffsetUniform::from(params.noise));
        self.contour
            .update_uniform_buffer(queue, ScaleOffsetUniform::from(params.contour));

        encoder.finish()
    }
}
