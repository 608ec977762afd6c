//! Per-frame animation parameters.
//!
//! [`FrameScheduler`] owns the only state that survives between frames: the
//! previous tick timestamp and the accumulated offsets. Each call to
//! [`FrameScheduler::tick`] turns a timestamp, the current surface size, and
//! the pointer snapshot into the scale/offset pairs pushed to both GPU stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::pointer::PointerState;
use crate::surface::SurfaceSize;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Scale and offset for one stage, in the order they are uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaleOffset {
    pub scale: Vec2,
    pub offset: Vec2,
}

/// Tunables for the drift/zoom behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPolicy {
    /// `scale.x + scale.y` before pointer zoom is applied.
    pub scale_sum: f64,
    /// Vertical scroll speed in noise units per second.
    pub drift: f64,
    /// How strongly the pointer nudges the field, per second.
    pub pointer_gain: f64,
    /// Strength of the pointer-distance zoom; 0 disables it.
    pub pointer_zoom: f64,
    /// Contour offset increments relative to the noise offset increments.
    pub contour_drift_ratio: f64,
    pub initial_offset: Vec2,
}

impl Default for AnimationPolicy {
    fn default() -> Self {
        Self {
            scale_sum: 6.0,
            drift: 0.1,
            pointer_gain: 0.5,
            pointer_zoom: 0.0,
            contour_drift_ratio: 1.0,
            initial_offset: Vec2::new(100.0, 100.0),
        }
    }
}

/// Everything the GPU side needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub noise: ScaleOffset,
    pub contour: ScaleOffset,
    /// Seconds since the previous tick.
    pub delta: f64,
    /// Pointer-distance zoom in `[0, 1]` (0 while the pointer is outside).
    pub zoom: f64,
}

/// Cancels a running frame loop. Cheap to clone and share with hosts; the
/// browser host hands one back to JavaScript from `start`.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen)]
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen)]
impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = isStopped))]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Aspect-weighted scale: keeps the spatial frequency stable across ratios.
pub fn aspect_scale(size: SurfaceSize, scale_sum: f64) -> Vec2 {
    let width = size.width.max(1) as f64;
    let height = size.height.max(1) as f64;
    let total = width + height;
    Vec2::new(scale_sum * width / total, scale_sum * height / total)
}

struct FrameStats {
    window_start: Option<f64>,
    frames: u32,
    total_frames: u64,
}

impl FrameStats {
    fn record(&mut self, timestamp_ms: f64, offset: Vec2) {
        self.total_frames = self.total_frames.saturating_add(1);
        let start = *self.window_start.get_or_insert(timestamp_ms);
        self.frames += 1;
        let elapsed = timestamp_ms - start;
        if elapsed >= 1000.0 {
            let fps = self.frames as f64 * 1000.0 / elapsed;
            debug!(
                fps = fps.round(),
                frame_count = self.total_frames,
                offset_x = offset.x,
                offset_y = offset.y,
                "render stats"
            );
            self.window_start = Some(timestamp_ms);
            self.frames = 0;
        }
    }
}

pub struct FrameScheduler {
    policy: AnimationPolicy,
    previous_tick: Option<f64>,
    offset: Vec2,
    contour_offset: Vec2,
    stop: StopHandle,
    stats: FrameStats,
}

impl FrameScheduler {
    pub fn new(policy: AnimationPolicy) -> Self {
        Self {
            policy,
            previous_tick: None,
            offset: policy.initial_offset,
            contour_offset: policy.initial_offset,
            stop: StopHandle::default(),
            stats: FrameStats {
                window_start: None,
                frames: 0,
                total_frames: 0,
            },
        }
    }

    /// Shares an existing stop flag instead of creating a fresh one.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that ends the loop on its next tick.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Advances the animation to `timestamp_ms`. Returns `None` once stopped.
    pub fn tick(
        &mut self,
        timestamp_ms: f64,
        size: SurfaceSize,
        pointer: PointerState,
    ) -> Option<FrameParams> {
        if self.stop.is_stopped() {
            return None;
        }

        let delta = match self.previous_tick {
            Some(previous) if timestamp_ms > previous => (timestamp_ms - previous) / 1000.0,
            _ => 0.0,
        };
        self.previous_tick = Some(timestamp_ms);

        let zoom = if pointer.inside { pointer.zoom() } else { 0.0 };
        let zoom_factor = 1.0 + self.policy.pointer_zoom * zoom;
        let base = aspect_scale(size, self.policy.scale_sum);
        let scale = Vec2::new(base.x * zoom_factor, base.y * zoom_factor);

        let mut step = Vec2::new(0.0, self.policy.drift * delta);
        if pointer.inside {
            step.x += pointer.x * self.policy.pointer_gain * delta;
            step.y -= pointer.y * self.policy.pointer_gain * delta;
        }
        self.offset.x += step.x;
        self.offset.y += step.y;
        let ratio = self.policy.contour_drift_ratio;
        self.contour_offset.x += step.x * ratio;
        self.contour_offset.y += step.y * ratio;

        self.stats.record(timestamp_ms, self.offset);

        Some(FrameParams {
            noise: ScaleOffset {
                scale,
                offset: self.offset,
            },
            contour: ScaleOffset {
                scale,
                offset: self.contour_offset,
            },
            delta,
            zoom,
        })
    }
}
