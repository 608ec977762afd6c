//! Second pass: samples the noise target and draws contour bands onto the
//! presentation surface.

use tracing::warn;

use super::pipeline::{clear_pass, fullscreen_pipeline};
use super::shaders::StageShader;
use super::uniforms::{create_uniform_buffer, write_uniform, ScaleOffsetUniform};

const CONTOUR_CLEAR: wgpu::Color = wgpu::Color::BLACK;

pub struct ContourStage {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
}

impl ContourStage {
    /// `format` is the format of the textures passed to [`Self::render_pass`].
    pub fn new(device: &wgpu::Device, shader: &StageShader, format: wgpu::TextureFormat) -> Self {
        let pipeline = fullscreen_pipeline(device, "contour pipeline", shader, format);
        let layout = pipeline.get_bind_group_layout(0);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("contour sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let uniform_buffer = create_uniform_buffer(device, "contour uniforms");
        Self {
            pipeline,
            layout,
            sampler,
            uniform_buffer,
            bind_group: None,
        }
    }

    /// Rebinds the sampled texture. Must be called each frame before
    /// [`Self::render_pass`] since the noise target may have been reallocated.
    pub fn set_input_texture(&mut self, device: &wgpu::Device, view: &wgpu::TextureView) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("contour bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        }));
    }

    pub fn has_input(&self) -> bool {
        self.bind_group.is_some()
    }

    pub fn render_pass(&self, encoder: &mut wgpu::CommandEncoder, destination: &wgpu::Texture) {
        let Some(bind_group) = &self.bind_group else {
            warn!("contour pass skipped: no input texture bound");
            return;
        };
        let view = destination.create_view(&wgpu::TextureViewDescriptor::default());
        let mut pass = clear_pass(encoder, "contour pass", &view, CONTOUR_CLEAR);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    pub fn update_uniform_buffer(&self, queue: &wgpu::Queue, uniform: ScaleOffsetUniform) {
        write_uniform(queue, &self.uniform_buffer, uniform);
    }
}
