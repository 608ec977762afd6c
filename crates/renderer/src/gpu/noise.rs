//! First pass: renders the gradient-noise field into an offscreen texture.
//!
//! The offscreen target follows the presentation size. Consumers hold a
//! [`TargetHandle`] and resolve it through [`NoiseStage::target_view`] every
//! frame; a handle from before the last reallocation resolves to `None`.

use tracing::{debug, warn};

use super::pipeline::{clear_pass, fullscreen_pipeline};
use super::shaders::StageShader;
use super::target::{Releasable, TargetHandle, TargetSlot};
use super::uniforms::{create_uniform_buffer, write_uniform, ScaleOffsetUniform};
use crate::surface::SurfaceSize;

pub const NOISE_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const NOISE_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.3,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

pub(crate) struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl OffscreenTarget {
    fn allocate(device: &wgpu::Device, size: SurfaceSize) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("noise target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: NOISE_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

impl Releasable for OffscreenTarget {
    fn release(&mut self) {
        self.texture.destroy();
    }
}

pub struct NoiseStage {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    target: TargetSlot<OffscreenTarget>,
}

impl NoiseStage {
    pub fn new(device: &wgpu::Device, shader: &StageShader) -> Self {
        let pipeline = fullscreen_pipeline(device, "noise pipeline", shader, NOISE_TARGET_FORMAT);
        let uniform_buffer = create_uniform_buffer(device, "noise uniforms");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("noise bind group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            target: TargetSlot::new(),
        }
    }

    /// Makes sure the offscreen target matches `size` and returns its handle.
    pub fn update_render_target(&mut self, device: &wgpu::Device, size: SurfaceSize) -> TargetHandle {
        self.target.ensure(size, |size| {
            debug!(width = size.width, height = size.height, "allocating noise target");
            OffscreenTarget::allocate(device, size)
        })
    }

    pub fn target_view(&self, handle: TargetHandle) -> Option<&wgpu::TextureView> {
        self.target.get(handle).map(|target| &target.view)
    }

    pub fn current_target(&self) -> Option<TargetHandle> {
        self.target.current().map(|(handle, _)| handle)
    }

    pub fn render_pass(&self, encoder: &mut wgpu::CommandEncoder) {
        let Some((_, target)) = self.target.current() else {
            warn!("noise pass skipped: no render target allocated");
            return;
        };
        let mut pass = clear_pass(encoder, "noise pass", &target.view, NOISE_CLEAR);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    pub fn update_uniform_buffer(&self, queue: &wgpu::Queue, uniform: ScaleOffsetUniform) {
        write_uniform(queue, &self.uniform_buffer, uniform);
    }
}
