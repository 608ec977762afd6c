use crate::gpu::StageShader;
use crate::scheduler::AnimationPolicy;
use crate::surface::SurfaceSize;

/// Adapter preference forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels. The web host ignores it and
    /// measures the canvas instead.
    pub surface_size: SurfaceSize,
    pub title: String,
    pub power: GpuPowerPreference,
    pub policy: AnimationPolicy,
    pub noise_shader: StageShader,
    pub contour_shader: StageShader,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: SurfaceSize::new(1280, 720),
            title: "topo".to_string(),
            power: GpuPowerPreference::default(),
            policy: AnimationPolicy::default(),
            noise_shader: StageShader::noise(),
            contour_shader: StageShader::contour(),
        }
    }
}
