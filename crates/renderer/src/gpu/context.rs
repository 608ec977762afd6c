use crate::error::SetupError;
use crate::surface::SurfaceSize;
use crate::types::GpuPowerPreference;

/// Device, queue, and configured presentation surface.
pub(crate) struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: SurfaceSize,
    pub surface_format: wgpu::TextureFormat,
    pub max_texture_dimension: u32,
}

impl GpuContext {
    /// Picks an adapter for `surface`, creates the device, and configures the
    /// surface at `initial_size` (clamped to the device limit).
    pub(crate) async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        initial_size: SurfaceSize,
        power: GpuPowerPreference,
    ) -> Result<Self, SetupError> {
        let power_preference = match power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| SetupError::Unsupported(format!("no suitable GPU adapter: {err}")))?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            max_texture_dimension_2d = limits.max_texture_dimension_2d,
            "selected GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("topo device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits.clone(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|err| SetupError::Unsupported(format!("failed to create GPU device: {err}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The first non-sRGB format matches what browsers report as the
        // preferred canvas format; fall back to whatever comes first.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                SetupError::Unsupported("surface reports no supported formats".to_string())
            })?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let max_texture_dimension = limits.max_texture_dimension_2d.max(1);
        let size = SurfaceSize::new(
            initial_size.width.clamp(1, max_texture_dimension),
            initial_size.height.clamp(1, max_texture_dimension),
        );
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(?surface_format, width = size.width, height = size.height, "configured surface");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
            max_texture_dimension,
        })
    }

    /// Reconfigures the surface. Sizes are expected to be clamped already;
    /// they are clamped again so a bad caller cannot configure a zero extent.
    pub(crate) fn resize(&mut self, new_size: SurfaceSize) {
        let size = SurfaceSize::new(
            new_size.width.clamp(1, self.max_texture_dimension),
            new_size.height.clamp(1, self.max_texture_dimension),
        );
        self.size = size;
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}
