//! Browser host: a canvas, a `ResizeObserver`, document mouse listeners and a
//! self-rescheduling `requestAnimationFrame` callback.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use tracing::{debug, error};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, ResizeObserver, ResizeObserverEntry, ResizeObserverSize};

use crate::error::{ObserveError, SetupError};
use crate::gpu::{GpuContext, GpuState};
use crate::pointer::{PointerFeed, PointerTracker};
use crate::runtime::{FrameLoop, LoopControl};
use crate::scheduler::{FrameScheduler, StopHandle};
use crate::surface::{
    ObservationMode, SizeFeed, SizeObservation, SizeSource, SurfaceSize, SurfaceSizeSynchronizer,
};
use crate::types::RendererConfig;

const UNSUPPORTED_MESSAGE: &str = "WebGPU is not supported.";

fn js_error(message: impl AsRef<str>) -> JsValue {
    JsValue::from_str(message.as_ref())
}

fn browser_window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| js_error("no global window"))
}

// Events reach the console through `log` because no tracing subscriber is
// installed on this target.
fn install_console_logging() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

/// Starts rendering into the canvas with id `canvas_id` and resolves to a
/// [`StopHandle`]; calling `stop()` on it ends the animation loop.
///
/// Rejects with "WebGPU is not supported." and hides the canvas when no
/// adapter or device is available.
#[wasm_bindgen]
pub async fn start(canvas_id: String) -> Result<StopHandle, JsValue> {
    install_console_logging();
    let window = browser_window()?;
    let document = window
        .document()
        .ok_or_else(|| js_error("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| js_error(format!("no element with id `{canvas_id}`")))?
        .dyn_into()?;

    match start_on_canvas(&window, &document, canvas.clone(), RendererConfig::default()).await {
        Ok(stop) => Ok(stop),
        Err(SetupError::Unsupported(reason)) => {
            error!(%reason, "GPU setup failed");
            canvas.set_attribute("style", "display:none;")?;
            Err(js_error(UNSUPPORTED_MESSAGE))
        }
        Err(err) => Err(js_error(err.to_string())),
    }
}

async fn start_on_canvas(
    window: &web_sys::Window,
    document: &web_sys::Document,
    canvas: HtmlCanvasElement,
    config: RendererConfig,
) -> Result<StopHandle, SetupError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU,
        ..Default::default()
    });
    let surface = instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
        .map_err(|err| SetupError::Unsupported(format!("failed to create canvas surface: {err}")))?;

    let ratio = window.device_pixel_ratio();
    let initial = SurfaceSize::new(
        (canvas.client_width() as f64 * ratio).round().max(1.0) as u32,
        (canvas.client_height() as f64 * ratio).round().max(1.0) as u32,
    );
    let context = GpuContext::new(&instance, surface, initial, config.power).await?;
    let gpu = GpuState::new(context, &config.noise_shader, &config.contour_shader);

    let (mut sizes, size_feed) =
        SurfaceSizeSynchronizer::new(gpu.size(), gpu.max_texture_dimension());
    let mut observer = CanvasObserver::new(canvas.clone(), size_feed)?;
    let mode = sizes.register(&mut observer)?;
    debug!(?mode, "observing canvas size");
    observer.set_mode(mode);
    apply_backing_size(&canvas, sizes.current());

    let (pointer, pointer_feed) = PointerTracker::new();
    listen_for_pointer(window, document, pointer_feed)?;

    let scheduler = FrameScheduler::new(config.policy);
    let frame_loop = FrameLoop::new(gpu, sizes, pointer, scheduler);
    let stop = frame_loop.stop_handle();
    run_animation_frames(window.clone(), canvas, frame_loop, observer);
    Ok(stop)
}

fn apply_backing_size(canvas: &HtmlCanvasElement, size: SurfaceSize) {
    canvas.set_width(size.width);
    canvas.set_height(size.height);
}

/// `ResizeObserver` wrapper that reports the canvas content box.
struct CanvasObserver {
    canvas: HtmlCanvasElement,
    observer: ResizeObserver,
    mode: Rc<Cell<ObservationMode>>,
    _callback: Closure<dyn FnMut(Array, ResizeObserver)>,
}

impl CanvasObserver {
    fn new(canvas: HtmlCanvasElement, feed: SizeFeed) -> Result<Self, SetupError> {
        let mode = Rc::new(Cell::new(ObservationMode::DevicePixelContentBox));
        let callback_mode = mode.clone();
        let callback = Closure::<dyn FnMut(Array, ResizeObserver)>::new(
            move |entries: Array, _observer: ResizeObserver| {
                let ratio = web_sys::window()
                    .map(|window| window.device_pixel_ratio())
                    .unwrap_or(1.0);
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<ResizeObserverEntry>() else {
                        continue;
                    };
                    if let Some(observation) = observe_entry(&entry, callback_mode.get(), ratio) {
                        feed.push(observation);
                    }
                }
            },
        );
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|err| SetupError::Unsupported(format!("ResizeObserver unavailable: {err:?}")))?;
        Ok(Self {
            canvas,
            observer,
            mode,
            _callback: callback,
        })
    }

    fn set_mode(&self, mode: ObservationMode) {
        self.mode.set(mode);
    }
}

impl SizeSource for CanvasObserver {
    fn observe(&mut self, mode: ObservationMode) -> Result<(), ObserveError> {
        let box_name = match mode {
            ObservationMode::DevicePixelContentBox => "device-pixel-content-box",
            ObservationMode::ContentBox => "content-box",
        };
        let options = Object::new();
        Reflect::set(&options, &"box".into(), &box_name.into())
            .map_err(|err| ObserveError::Rejected(format!("{err:?}")))?;
        let observe: Function = Reflect::get(&self.observer, &"observe".into())
            .and_then(|value| value.dyn_into())
            .map_err(|err| ObserveError::Rejected(format!("{err:?}")))?;
        // Calling through `Function` turns a thrown exception into `Err`.
        observe
            .call2(&self.observer, &self.canvas, &options)
            .map(|_| self.mode.set(mode))
            .map_err(|err| ObserveError::Rejected(format!("{box_name}: {err:?}")))
    }
}

impl Drop for CanvasObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn first_size(sizes: JsValue) -> Option<(f64, f64)> {
    let sizes: Array = sizes.dyn_into().ok()?;
    let size: ResizeObserverSize = sizes.get(0).dyn_into().ok()?;
    Some((size.inline_size(), size.block_size()))
}

fn box_size(entry: &ResizeObserverEntry, field: &str) -> Option<(f64, f64)> {
    Reflect::get(entry, &field.into()).ok().and_then(first_size)
}

// Some browsers accept `device-pixel-content-box` but leave the field off
// their entries, so each entry falls back to the content box on its own.
fn observe_entry(
    entry: &ResizeObserverEntry,
    mode: ObservationMode,
    device_pixel_ratio: f64,
) -> Option<SizeObservation> {
    let device_pixels = match mode {
        ObservationMode::DevicePixelContentBox => box_size(entry, "devicePixelContentBoxSize"),
        ObservationMode::ContentBox => None,
    };
    let content_box = box_size(entry, "contentBoxSize");
    SizeObservation::from_measurements(mode, device_pixels, content_box, device_pixel_ratio)
}

fn listen_for_pointer(
    window: &web_sys::Window,
    document: &web_sys::Document,
    feed: PointerFeed,
) -> Result<(), SetupError> {
    let listen_error =
        |err: JsValue| SetupError::Unsupported(format!("failed to add listener: {err:?}"));

    let move_feed = feed.clone();
    let move_window = window.clone();
    let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        let width = move_window
            .inner_width()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        let height = move_window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        move_feed.moved(event.client_x() as f64, event.client_y() as f64, width, height);
    });
    document
        .add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())
        .map_err(listen_error)?;
    on_move.forget();

    let enter_feed = feed.clone();
    let on_enter = Closure::<dyn FnMut()>::new(move || enter_feed.entered());
    document
        .add_event_listener_with_callback("mouseenter", on_enter.as_ref().unchecked_ref())
        .map_err(listen_error)?;
    on_enter.forget();

    let on_leave = Closure::<dyn FnMut()>::new(move || feed.left());
    document
        .add_event_listener_with_callback("mouseleave", on_leave.as_ref().unchecked_ref())
        .map_err(listen_error)?;
    on_leave.forget();

    Ok(())
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(window: &web_sys::Window, callback: &FrameCallback) {
    if let Some(closure) = callback.borrow().as_ref() {
        if let Err(err) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            error!(error = ?err, "requestAnimationFrame failed");
        }
    }
}

fn run_animation_frames(
    window: web_sys::Window,
    canvas: HtmlCanvasElement,
    mut frame_loop: FrameLoop,
    observer: CanvasObserver,
) {
    // The closure keeps a clone of its own slot so it can re-request itself.
    // Once stopped it simply stops re-requesting.
    let slot: FrameCallback = Rc::new(RefCell::new(None));
    let next = slot.clone();
    let frame_window = window.clone();
    let mut observer = Some(observer);
    *slot.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |timestamp_ms: f64| {
        let control = frame_loop.step(timestamp_ms, |size| apply_backing_size(&canvas, size));
        match control {
            LoopControl::Continue => request_frame(&frame_window, &next),
            LoopControl::Stop => {
                // Dropping the observer disconnects it.
                if observer.take().is_some() {
                    debug!("animation loop stopped");
                }
            }
        }
    }));
    request_frame(&window, &slot);
}
