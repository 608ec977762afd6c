//! Host-independent per-tick work shared by the native and web loops.

use crate::gpu::{GpuState, SurfaceRecovery};
use crate::pointer::PointerTracker;
use crate::scheduler::{FrameScheduler, StopHandle};
use crate::surface::{SurfaceSize, SurfaceSizeSynchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Stop,
}

pub(crate) struct FrameLoop {
    gpu: GpuState,
    sizes: SurfaceSizeSynchronizer,
    pointer: PointerTracker,
    scheduler: FrameScheduler,
}

impl FrameLoop {
    pub(crate) fn new(
        gpu: GpuState,
        sizes: SurfaceSizeSynchronizer,
        pointer: PointerTracker,
        scheduler: FrameScheduler,
    ) -> Self {
        Self {
            gpu,
            sizes,
            pointer,
            scheduler,
        }
    }

    pub(crate) fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.gpu.size()
    }

    /// Runs one tick at `timestamp_ms`. `on_resize` sees the new backing size
    /// before the surface is reconfigured.
    pub(crate) fn step(
        &mut self,
        timestamp_ms: f64,
        on_resize: impl FnOnce(SurfaceSize),
    ) -> LoopControl {
        if self.scheduler.is_stopped() {
            return LoopControl::Stop;
        }
        if let Some(size) = self.sizes.sync() {
            on_resize(size);
            self.gpu.resize(size);
        }
        let pointer = self.pointer.sync();
        let Some(params) = self.scheduler.tick(timestamp_ms, self.gpu.size(), pointer) else {
            return LoopControl::Stop;
        };

        match self.gpu.render(&params) {
            Ok(()) => LoopControl::Continue,
            Err(err) => match self.gpu.recover(err) {
                SurfaceRecovery::Reconfigured | SurfaceRecovery::Skip => LoopControl::Continue,
                SurfaceRecovery::Exit => {
                    self.scheduler.stop_handle().stop();
                    LoopControl::Stop
                }
            },
        }
    }
}
