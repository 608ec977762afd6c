//! Keeps the drawable surface's backing resolution in step with its displayed
//! size.
//!
//! Hosts push [`SizeObservation`]s through a [`SizeFeed`] whenever the element
//! or window changes size; the frame loop drains them once per tick via
//! [`SurfaceSizeSynchronizer::sync`]. Every resolved axis is clamped to
//! `[1, max_texture_dimension_2d]` so a render target is never zero-sized and
//! never exceeds what the device can allocate.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::error::ObserveError;

/// Integer pixel size of the presentation surface after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How a size-change notification measured the element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeObservation {
    /// Exact device-pixel content box.
    DevicePixels { width: f64, height: f64 },
    /// CSS content box that still needs the device pixel ratio applied.
    ContentBox {
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    },
}

impl SizeObservation {
    /// Builds the observation for one resize notification. In device-pixel
    /// mode the device-pixel box wins when the host filled it in with a
    /// non-zero size; otherwise the content box is used with `device_pixel_ratio`.
    pub fn from_measurements(
        mode: ObservationMode,
        device_pixels: Option<(f64, f64)>,
        content_box: Option<(f64, f64)>,
        device_pixel_ratio: f64,
    ) -> Option<Self> {
        if mode == ObservationMode::DevicePixelContentBox {
            if let Some((width, height)) = device_pixels.filter(|&(w, h)| w > 0.0 && h > 0.0) {
                return Some(SizeObservation::DevicePixels { width, height });
            }
        }
        content_box.map(|(width, height)| SizeObservation::ContentBox {
            width,
            height,
            device_pixel_ratio,
        })
    }

    /// Measured size in device pixels, before clamping.
    pub fn device_pixels(&self) -> (f64, f64) {
        match *self {
            SizeObservation::DevicePixels { width, height } => (width, height),
            SizeObservation::ContentBox {
                width,
                height,
                device_pixel_ratio,
            } => (width * device_pixel_ratio, height * device_pixel_ratio),
        }
    }
}

/// Box model requested from the host's size observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationMode {
    DevicePixelContentBox,
    ContentBox,
}

/// A host primitive that can deliver size notifications for the surface.
pub trait SizeSource {
    /// Starts observing in `mode`. Hosts that cannot honour the mode must
    /// return an error so the caller can fall back.
    fn observe(&mut self, mode: ObservationMode) -> Result<(), ObserveError>;
}

/// Clamps one measured axis into `[1, max_dimension]`.
pub fn clamp_dimension(measured: f64, max_dimension: u32) -> u32 {
    let max_dimension = max_dimension.max(1);
    if !measured.is_finite() {
        return if measured == f64::INFINITY {
            max_dimension
        } else {
            1
        };
    }
    let rounded = measured.round();
    if rounded < 1.0 {
        1
    } else if rounded >= max_dimension as f64 {
        max_dimension
    } else {
        rounded as u32
    }
}

/// Resolves an observation into a backing size that respects device limits.
pub fn resolve_size(observation: SizeObservation, max_dimension: u32) -> SurfaceSize {
    let (width, height) = observation.device_pixels();
    SurfaceSize::new(
        clamp_dimension(width, max_dimension),
        clamp_dimension(height, max_dimension),
    )
}

/// Cloneable handle hosts use to report size changes.
#[derive(Debug, Clone)]
pub struct SizeFeed {
    sender: Sender<SizeObservation>,
}

impl SizeFeed {
    pub fn push(&self, observation: SizeObservation) {
        // The synchronizer owns the receiver; once it is gone nobody cares.
        let _ = self.sender.send(observation);
    }
}

pub struct SurfaceSizeSynchronizer {
    max_dimension: u32,
    current: SurfaceSize,
    mode: Option<ObservationMode>,
    receiver: Receiver<SizeObservation>,
}

impl SurfaceSizeSynchronizer {
    /// Creates a synchronizer seeded with `initial` (clamped) and the feed that
    /// hosts should push observations into.
    pub fn new(initial: SurfaceSize, max_dimension: u32) -> (Self, SizeFeed) {
        let (sender, receiver) = unbounded();
        let current = SurfaceSize::new(
            clamp_dimension(initial.width as f64, max_dimension),
            clamp_dimension(initial.height as f64, max_dimension),
        );
        (
            Self {
                max_dimension: max_dimension.max(1),
                current,
                mode: None,
                receiver,
            },
            SizeFeed { sender },
        )
    }

    /// Registers with the host observer, preferring device-pixel measurement.
    pub fn register<S: SizeSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<ObservationMode, ObserveError> {
        let mode = match source.observe(ObservationMode::DevicePixelContentBox) {
            Ok(()) => ObservationMode::DevicePixelContentBox,
            Err(err) => {
                debug!(error = %err, "device-pixel observation rejected; using content box");
                source.observe(ObservationMode::ContentBox)?;
                ObservationMode::ContentBox
            }
        };
        self.mode = Some(mode);
        Ok(mode)
    }

    pub fn mode(&self) -> Option<ObservationMode> {
        self.mode
    }

    pub fn current(&self) -> SurfaceSize {
        self.current
    }

    /// Applies one observation immediately and returns the resolved size.
    pub fn apply(&mut self, observation: SizeObservation) -> SurfaceSize {
        self.current = resolve_size(observation, self.max_dimension);
        self.current
    }

    /// Drains pending observations. Returns the new size when it changed.
    pub fn sync(&mut self) -> Option<SurfaceSize> {
        let before = self.current;
        while let Ok(observation) = self.receiver.try_recv() {
            self.apply(observation);
        }
        (self.current != before).then_some(self.current)
    }
}
