//! GPU side of the renderer.
//!
//! - `context` picks the adapter, creates the device, and configures the
//!   presentation surface.
//! - `noise` renders the noise field into a reallocatable offscreen target
//!   tracked by `target`.
//! - `contour` samples that target and draws onto the surface.
//! - `frame` records both passes into one encoder per frame.
//! - `state` acquires the surface texture, submits, and presents.

mod context;
mod contour;
mod frame;
mod noise;
mod pipeline;
mod shaders;
mod state;
mod target;
mod uniforms;

pub(crate) use context::GpuContext;
pub use contour::ContourStage;
pub use frame::FramePipeline;
pub use noise::{NoiseStage, NOISE_TARGET_FORMAT};
pub use shaders::{validate_wgsl, StageShader, CONTOUR_WGSL, NOISE_WGSL};
pub(crate) use state::GpuState;
pub use state::SurfaceRecovery;
pub use target::TargetHandle;
pub use uniforms::{ScaleOffsetUniform, SCALE_OFFSET_BYTES};
