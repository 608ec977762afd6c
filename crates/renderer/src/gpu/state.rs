use tracing::{error, warn};

use super::context::GpuContext;
use super::frame::FramePipeline;
use super::shaders::StageShader;
use crate::scheduler::FrameParams;
use crate::surface::SurfaceSize;

/// What the frame loop should do after a failed surface acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRecovery {
    /// The surface was reconfigured; try again next frame.
    Reconfigured,
    /// Drop this frame and carry on.
    Skip,
    /// Stop rendering.
    Exit,
}

/// Owns the device, the surface and the [`FramePipeline`] drawing into it.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: FramePipeline,
}

impl GpuState {
    pub(crate) fn new(
        context: GpuContext,
        noise_shader: &StageShader,
        contour_shader: &StageShader,
    ) -> Self {
        let pipeline = FramePipeline::new(
            &context.device,
            noise_shader,
            contour_shader,
            context.surface_format,
        );
        Self { context, pipeline }
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.context.size
    }

    pub(crate) fn max_texture_dimension(&self) -> u32 {
        self.context.max_texture_dimension
    }

    pub(crate) fn resize(&mut self, size: SurfaceSize) {
        if size != self.context.size {
            self.context.resize(size);
        }
    }

    pub(crate) fn render(&mut self, params: &FrameParams) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let commands = self.pipeline.encode_frame(
            &self.context.device,
            &self.context.queue,
            &frame.texture,
            self.context.size,
            params,
        );
        self.context.queue.submit(std::iter::once(commands));
        frame.present();
        Ok(())
    }

    /// Applies the recovery policy for a surface error raised by [`Self::render`].
    pub(crate) fn recover(&mut self, err: wgpu::SurfaceError) -> SurfaceRecovery {
        let recovery = recovery_for(&err);
        match recovery {
            SurfaceRecovery::Reconfigured => self.context.reconfigure(),
            SurfaceRecovery::Skip => warn!(error = %err, "surface error; skipping frame"),
            SurfaceRecovery::Exit => error!(error = %err, "surface error; stopping renderer"),
        }
        recovery
    }
}

pub(crate) fn recovery_for(err: &wgpu::SurfaceError) -> SurfaceRecovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Exit,
        _ => SurfaceRecovery::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_errors_map_to_recovery() {
        assert_eq!(
            recovery_for(&wgpu::SurfaceError::Lost),
            SurfaceRecovery::Reconfigured
        );
        assert_eq!(
            recovery_for(&wgpu::SurfaceError::Outdated),
            SurfaceRecovery::Reconfigured
        );
        assert_eq!(recovery_for(&wgpu::SurfaceError::Timeout), SurfaceRecovery::Skip);
        assert_eq!(
            recovery_for(&wgpu::SurfaceError::OutOfMemory),
            SurfaceRecovery::Exit
        );
    }
}
