//! Two-pass `wgpu` renderer for an animated topographic background.
//!
//! ```text
//!   host events ──▶ SizeFeed / PointerFeed
//!                          │ drained once per tick
//!                          ▼
//!   tick(t) ──▶ FrameScheduler ──▶ FrameParams
//!                          │
//!                          ├─▶ NoiseStage   ──▶ offscreen Rgba8Unorm target
//!                          └─▶ ContourStage ──▶ presentation surface
//! ```
//!
//! Native hosts call [`Renderer::run`], which opens a winit window and blocks.
//! On `wasm32` the exported `start(canvas_id)` function drives a canvas with
//! `requestAnimationFrame` and resolves to a [`StopHandle`].

mod error;
mod gpu;
mod pointer;
mod runtime;
mod scheduler;
mod surface;
mod types;

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(not(target_arch = "wasm32"))]
mod window;

pub use error::{ObserveError, SetupError};
pub use gpu::{
    validate_wgsl, ContourStage, FramePipeline, NoiseStage, ScaleOffsetUniform, StageShader, SurfaceRecovery,
    TargetHandle, CONTOUR_WGSL, NOISE_TARGET_FORMAT, NOISE_WGSL, SCALE_OFFSET_BYTES,
};
pub use pointer::{PointerEvent, PointerFeed, PointerState, PointerTracker};
pub use scheduler::{
    aspect_scale, AnimationPolicy, FrameParams, FrameScheduler, ScaleOffset, StopHandle, Vec2,
};
pub use surface::{
    clamp_dimension, resolve_size, ObservationMode, SizeFeed, SizeObservation, SizeSource,
    SurfaceSize, SurfaceSizeSynchronizer,
};
pub use types::{GpuPowerPreference, RendererConfig};

#[cfg(target_arch = "wasm32")]
pub use web::start;

/// Entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
    stop: StopHandle,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            stop: StopHandle::default(),
        }
    }

    /// Handle that closes the window from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Opens the window and renders until it is closed.
    ///
    /// Fails with [`SetupError::Unsupported`] before the window is shown when
    /// no adapter or device is available.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run(&self) -> Result<(), SetupError> {
        window::run(&self.config, self.stop.clone())
    }
}
