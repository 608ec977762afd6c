use std::sync::Arc;
use std::time::Instant;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::error::{ObserveError, SetupError};
use crate::gpu::{GpuContext, GpuState};
use crate::pointer::PointerTracker;
use crate::runtime::{FrameLoop, LoopControl};
use crate::scheduler::{FrameScheduler, StopHandle};
use crate::surface::{
    ObservationMode, SizeObservation, SizeSource, SurfaceSize, SurfaceSizeSynchronizer,
};
use crate::types::RendererConfig;

/// winit always reports physical sizes, so device-pixel observation is
/// available on every native platform.
struct WindowSizeSource;

impl SizeSource for WindowSizeSource {
    fn observe(&mut self, _mode: ObservationMode) -> Result<(), ObserveError> {
        Ok(())
    }
}

fn create_surface(
    instance: &wgpu::Instance,
    window: &Window,
) -> Result<wgpu::Surface<'static>, SetupError> {
    let window_handle = window
        .window_handle()
        .map_err(|err| SetupError::Unsupported(format!("failed to acquire window handle: {err}")))?;
    let display_handle = window
        .display_handle()
        .map_err(|err| SetupError::Unsupported(format!("failed to acquire display handle: {err}")))?;
    let raw_window_handle = window_handle.as_raw();
    let raw_display_handle = display_handle.as_raw();
    // SAFETY: `Host` owns both the surface (through its frame loop) and the
    // window, and declares the frame loop first so it is dropped first.
    unsafe {
        instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle,
            raw_window_handle,
        })
    }
    .map_err(|err| SetupError::Unsupported(format!("failed to create rendering surface: {err}")))
}

struct Host {
    frame_loop: FrameLoop,
    window: Arc<Window>,
}

/// Opens the window and blocks until it is closed or `stop` is triggered.
///
/// The window stays hidden until the GPU is initialised, so a machine without
/// a usable adapter never shows an empty window.
pub(crate) fn run(config: &RendererConfig, stop: StopHandle) -> Result<(), SetupError> {
    let event_loop = EventLoop::new().map_err(|err| SetupError::EventLoop(err.to_string()))?;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(
            config.surface_size.width,
            config.surface_size.height,
        ))
        .with_visible(false)
        .build(&event_loop)
        .map_err(|err| SetupError::EventLoop(format!("failed to create window: {err}")))?;
    let window = Arc::new(window);

    let instance = wgpu::Instance::default();
    let surface = create_surface(&instance, &window)?;
    let inner = window.inner_size();
    let context = pollster::block_on(GpuContext::new(
        &instance,
        surface,
        SurfaceSize::new(inner.width, inner.height),
        config.power,
    ))?;
    let gpu = GpuState::new(context, &config.noise_shader, &config.contour_shader);

    let (mut sizes, size_feed) =
        SurfaceSizeSynchronizer::new(gpu.size(), gpu.max_texture_dimension());
    let mode = sizes.register(&mut WindowSizeSource)?;
    debug!(?mode, "observing window size");
    let (pointer, pointer_feed) = PointerTracker::new();
    let scheduler = FrameScheduler::new(config.policy).with_stop_handle(stop);
    let mut host = Host {
        frame_loop: FrameLoop::new(gpu, sizes, pointer, scheduler),
        window,
    };

    host.window.set_visible(true);
    host.window.request_redraw();
    let size = host.frame_loop.size();
    info!(width = size.width, height = size.height, "renderer started");

    let started = Instant::now();
    let stop = host.frame_loop.stop_handle();
    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::WindowEvent { window_id, event } if window_id == host.window.id() => match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        stop.stop();
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        size_feed.push(SizeObservation::DevicePixels {
                            width: new_size.width as f64,
                            height: new_size.height as f64,
                        });
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let viewport = host.window.inner_size();
                        pointer_feed.moved(
                            position.x,
                            position.y,
                            viewport.width as f64,
                            viewport.height as f64,
                        );
                    }
                    WindowEvent::CursorEntered { .. } => pointer_feed.entered(),
                    WindowEvent::CursorLeft { .. } => pointer_feed.left(),
                    WindowEvent::RedrawRequested => {
                        let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
                        if host.frame_loop.step(timestamp_ms, |_| {}) == LoopControl::Stop {
                            elwt.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if stop.is_stopped() {
                        elwt.exit();
                    } else {
                        host.window.request_redraw();
                    }
                }
                _ => {}
            }
        })
        .map_err(|err| SetupError::EventLoop(err.to_string()))
}
