//! Browser host
//!
//! Canvas 2D drawing from the page's sprite sheets, `requestAnimationFrame`
//! scheduling, DOM input and the optional remote controller socket.
//!
//! The page must provide a `<canvas id="runner-canvas">` plus one `<img>`
//! per sprite sheet (see [`Sprite::element_id`]).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, EventTarget, HtmlCanvasElement, HtmlImageElement,
    KeyboardEvent, MessageEvent, MouseEvent, UrlSearchParams, VisibilityState, WebSocket, Window,
};

use super::{FrameHandle, Host, InputEvent};
use crate::audio::{AudioManager, SoundEffect};
use crate::consts::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::relay::{ClientMessage, ControllerCommand, DEFAULT_PORT, Forwarded, ServerReply};
use crate::renderer::{Rect, Renderer, Sprite};
use crate::settings::RunnerConfig;
use crate::sim::Runner;

const CANVAS_ID: &str = "runner-canvas";

type SharedRunner = Rc<RefCell<Runner<WebHost>>>;

thread_local! {
    static APP: RefCell<Option<WebApp>> = const { RefCell::new(None) };
}

fn missing(what: &str) -> JsValue {
    JsValue::from_str(&format!("missing {}", what))
}

// === Host ===

pub struct WebHost {
    window: Window,
    ctx: CanvasRenderingContext2d,
    sheets: Vec<(Sprite, HtmlImageElement)>,
    /// Sheets are the 2x variants; source rects are doubled
    hidpi: bool,
    audio: AudioManager,
    /// Frame the animation callback will deliver
    scheduled: Rc<Cell<Option<FrameHandle>>>,
    on_animation_frame: Closure<dyn FnMut(f64)>,
}

impl WebHost {
    fn new(
        window: Window,
        ctx: CanvasRenderingContext2d,
        sheets: Vec<(Sprite, HtmlImageElement)>,
        hidpi: bool,
        audio: AudioManager,
        runner: Weak<RefCell<Runner<WebHost>>>,
    ) -> Self {
        let scheduled = Rc::new(Cell::new(None));
        let on_animation_frame = {
            let scheduled = Rc::clone(&scheduled);
            Closure::<dyn FnMut(f64)>::new(move |_time: f64| {
                if let Some(handle) = scheduled.take()
                    && let Some(runner) = runner.upgrade()
                {
                    runner.borrow_mut().on_frame(handle);
                }
            })
        };

        Self {
            window,
            ctx,
            sheets,
            hidpi,
            audio,
            scheduled,
            on_animation_frame,
        }
    }

    fn sheet(&self, sprite: Sprite) -> Option<&HtmlImageElement> {
        self.sheets
            .iter()
            .find(|(s, _)| *s == sprite)
            .map(|(_, image)| image)
    }
}

impl Renderer for WebHost {
    fn draw_sprite(&mut self, sprite: Sprite, source: Rect, dest: Rect) {
        let Some(image) = self.sheet(sprite) else {
            return;
        };
        let source = if self.hidpi { source.scaled(2.0) } else { source };
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                source.pos.x as f64,
                source.pos.y as f64,
                source.size.x as f64,
                source.size.y as f64,
                dest.pos.x as f64,
                dest.pos.y as f64,
                dest.size.x as f64,
                dest.size.y as f64,
            );
    }

    fn clear(&mut self, area: Rect) {
        self.ctx.clear_rect(
            area.pos.x as f64,
            area.pos.y as f64,
            area.size.x as f64,
            area.size.y as f64,
        );
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha as f64);
    }
}

impl Host for WebHost {
    fn now(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn request_frame(&mut self) -> Option<FrameHandle> {
        match self
            .window
            .request_animation_frame(self.on_animation_frame.as_ref().unchecked_ref())
        {
            Ok(id) => {
                let handle = FrameHandle(id as u64);
                self.scheduled.set(Some(handle));
                Some(handle)
            }
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.scheduled.get() == Some(handle) {
            self.scheduled.set(None);
            let _ = self.window.cancel_animation_frame(handle.0 as i32);
        }
    }

    fn play_sound(&mut self, effect: SoundEffect) {
        self.audio.play(effect);
    }

    fn vibrate(&mut self, duration_ms: u32) {
        let _ = self.window.navigator().vibrate_with_duration(duration_ms);
    }
}

// === DOM wiring ===

/// An event listener that is removed again when dropped
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Actor side of the relay: receives forwarded controller commands
struct ControllerLink {
    socket: WebSocket,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
}

impl Drop for ControllerLink {
    fn drop(&mut self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        let _ = self.socket.close();
    }
}

/// Everything that has to stay alive while the page runs the game
struct WebApp {
    runner: SharedRunner,
    _listeners: Vec<Listener>,
    _controller: Option<ControllerLink>,
}

/// Surface width: the canvas container, capped at the default width
fn surface_width(canvas: &HtmlCanvasElement) -> i32 {
    canvas
        .parent_element()
        .map(|parent| parent.client_width())
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
        .min(DEFAULT_WIDTH)
}

/// Size the backing store for the device pixel ratio and draw in CSS pixels
fn size_canvas(
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    width: i32,
    height: i32,
    dpr: f64,
) {
    canvas.set_width((width as f64 * dpr).floor() as u32);
    canvas.set_height((height as f64 * dpr).floor() as u32);
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", width));
    let _ = style.set_property("height", &format!("{}px", height));
    let _ = ctx.scale(dpr, dpr);
}

fn load_sheets(document: &Document, hidpi: bool) -> Vec<(Sprite, HtmlImageElement)> {
    Sprite::ALL
        .iter()
        .filter_map(|&sprite| {
            let id = sprite.element_id(hidpi);
            match document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
            {
                Some(image) => Some((sprite, image)),
                None => {
                    log::warn!("Sprite sheet #{} not found", id);
                    None
                }
            }
        })
        .collect()
}

fn input_listeners(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
    runner: &SharedRunner,
) -> Result<Vec<Listener>, JsValue> {
    let mut listeners = Vec::new();

    // Keyboard
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(document, "keydown", move |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let Some(input) = InputEvent::from_key_down(&key.key()) else {
                return;
            };
            event.prevent_default();
            if key.repeat() {
                return;
            }
            let mut runner = runner.borrow_mut();
            runner.host().audio.resume();
            runner.handle_input(input);
        })?);
    }
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(document, "keyup", move |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if let Some(input) = InputEvent::from_key_up(&key.key()) {
                runner.borrow_mut().handle_input(input);
            }
        })?);
    }

    // Touch
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(canvas, "touchstart", move |event| {
            event.prevent_default();
            let mut runner = runner.borrow_mut();
            runner.host().audio.resume();
            runner.handle_input(InputEvent::JumpPressed { touch: true });
        })?);
    }
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(canvas, "touchend", move |event| {
            event.prevent_default();
            runner.borrow_mut().handle_input(InputEvent::JumpReleased);
        })?);
    }

    // Mouse: left button only
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(canvas, "mousedown", move |event| {
            if event.dyn_ref::<MouseEvent>().is_some_and(|m| m.button() == 0) {
                let mut runner = runner.borrow_mut();
                runner.host().audio.resume();
                runner.handle_input(InputEvent::JumpPressed { touch: false });
            }
        })?);
    }
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(canvas, "mouseup", move |event| {
            if !event.dyn_ref::<MouseEvent>().is_some_and(|m| m.button() == 0) {
                return;
            }
            let mut runner = runner.borrow_mut();
            // A click on the surface restarts without waiting out the cool-down
            let input = if runner.is_crashed() {
                InputEvent::RestartPressed
            } else {
                InputEvent::JumpReleased
            };
            runner.handle_input(input);
        })?);
    }

    // Visibility and focus
    {
        let runner = Rc::clone(runner);
        let doc = document.clone();
        listeners.push(Listener::new(document, "visibilitychange", move |_| {
            let visible = doc.visibility_state() == VisibilityState::Visible;
            runner.borrow_mut().visibility_changed(visible);
        })?);
    }
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(window, "blur", move |_| {
            runner.borrow_mut().visibility_changed(false);
        })?);
    }
    {
        let runner = Rc::clone(runner);
        listeners.push(Listener::new(window, "focus", move |_| {
            runner.borrow_mut().visibility_changed(true);
        })?);
    }

    // Resize
    {
        let runner = Rc::clone(runner);
        let canvas = canvas.clone();
        let win = window.clone();
        listeners.push(Listener::new(window, "resize", move |_| {
            let width = surface_width(&canvas);
            let mut runner = runner.borrow_mut();
            size_canvas(
                &canvas,
                &runner.host().ctx,
                width,
                DEFAULT_HEIGHT,
                win.device_pixel_ratio(),
            );
            runner.handle_input(InputEvent::Resize {
                width,
                height: DEFAULT_HEIGHT,
            });
        })?);
    }

    Ok(listeners)
}

/// Register as the actor for `?gameId=` and apply whatever the controller sends.
/// `?relay=` overrides the relay URL.
fn connect_controller(
    window: &Window,
    runner: &SharedRunner,
) -> Result<Option<ControllerLink>, JsValue> {
    let location = window.location();
    let params = UrlSearchParams::new_with_str(&location.search()?)?;
    let Some(actor_id) = params.get("gameId") else {
        return Ok(None);
    };
    let url = params.get("relay").unwrap_or_else(|| {
        let host = location
            .hostname()
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        format!("ws://{}:{}", host, DEFAULT_PORT)
    });

    let socket = WebSocket::new(&url)?;
    log::info!("Connecting to relay {} as {}", url, actor_id);

    let on_open = {
        let socket = socket.clone();
        Closure::<dyn FnMut(Event)>::new(move |_| {
            let register = ClientMessage::Actor {
                actor_id: actor_id.clone(),
            };
            match serde_json::to_string(&register) {
                Ok(text) => {
                    if let Err(e) = socket.send_with_str(&text) {
                        log::warn!("Failed to register with relay: {:?}", e);
                    }
                }
                Err(e) => log::warn!("Failed to encode registration: {}", e),
            }
        })
    };
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let on_message = {
        let runner = Rc::clone(runner);
        Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                return;
            };
            match serde_json::from_str::<Forwarded>(&text) {
                Ok(forwarded) => match ControllerCommand::from_payload(&forwarded.payload) {
                    Some(command) => runner.borrow_mut().remote_command(command),
                    None => log::debug!("Unrecognised controller payload: {}", forwarded.payload),
                },
                Err(_) => match serde_json::from_str::<ServerReply>(&text) {
                    Ok(ServerReply::Error { message }) => log::warn!("Relay: {}", message),
                    Ok(reply) => log::debug!("Relay: {:?}", reply),
                    Err(e) => log::debug!("Ignoring relay message: {}", e),
                },
            }
        })
    };
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    Ok(Some(ControllerLink {
        socket,
        _on_open: on_open,
        _on_message: on_message,
    }))
}

/// Build the runner on the page's canvas and start it
pub fn run(config: RunnerConfig) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| missing("window"))?;
    let document = window.document().ok_or_else(|| missing("document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| missing(CANVAS_ID))?
        .dyn_into()
        .map_err(JsValue::from)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| missing("2d context"))?
        .dyn_into()
        .map_err(JsValue::from)?;

    let dpr = window.device_pixel_ratio();
    let hidpi = dpr > 1.0;
    let width = surface_width(&canvas);
    size_canvas(&canvas, &ctx, width, DEFAULT_HEIGHT, dpr);

    let sheets = load_sheets(&document, hidpi);
    let mut audio = AudioManager::new(config.volume);
    audio.set_muted(config.muted);
    let seed = getrandom::u64().unwrap_or_else(|e| {
        log::warn!("No entropy source ({}), seeding from the clock", e);
        js_sys::Date::now() as u64
    });

    let runner: SharedRunner = Rc::new_cyclic(|weak| {
        let host = WebHost::new(window.clone(), ctx, sheets, hidpi, audio, weak.clone());
        RefCell::new(Runner::with_dimensions(
            host,
            config,
            seed,
            width,
            DEFAULT_HEIGHT,
        ))
    });

    let listeners = input_listeners(&window, &document, &canvas, &runner)?;
    let controller = match connect_controller(&window, &runner) {
        Ok(link) => link,
        Err(e) => {
            log::warn!("Remote controller unavailable: {:?}", e);
            None
        }
    };

    log::info!("Rex runner started ({}x{}, seed {})", width, DEFAULT_HEIGHT, seed);

    APP.with(|app| {
        *app.borrow_mut() = Some(WebApp {
            runner,
            _listeners: listeners,
            _controller: controller,
        });
    });
    Ok(())
}

/// Detach every listener and close the relay socket
#[wasm_bindgen]
pub fn shutdown() {
    let app = APP.with(|app| app.borrow_mut().take());
    if let Some(app) = app {
        app.runner.borrow_mut().stop();
        log::info!("Rex runner shut down");
    }
}
