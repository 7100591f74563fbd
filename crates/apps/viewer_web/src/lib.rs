use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{Level, debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use config::ViewerConfig;
use foundation::Time;
use foundation::math::Coordinates;
use gpu::GlobeView;
use overlay::{
    ClickTarget, ContentForm, ContentKind, Key, KeyOutcome, Modal, Sleeper, attach_media,
    locate, submit,
};
use runtime::RenderLoop;
use scene::PointerButton;
use streaming::{TextureCache, load_texture};

mod browser;
mod logging;
mod page;
mod view;
mod wgpu;

use browser::{BrowserFile, BrowserPosition, GlooHttp, TimeoutSleeper};
use page::{DomPage, OverlayIds};
use view::FormView;
use wgpu::{WgpuSink, init_wgpu_from_canvas_id};

const CANVAS_ID: &str = "globe-canvas";

struct App {
    config: ViewerConfig,
    render_loop: RenderLoop<GlobeView<WgpuSink>>,
    modal: Modal<DomPage>,
    form: Option<Rc<RefCell<ContentForm>>>,
    on_change: Option<js_sys::Function>,
    raf_id: Option<i32>,
}

impl App {
    fn view_mut(&mut self) -> Option<&mut GlobeView<WgpuSink>> {
        self.render_loop.handler_mut()
    }

    /// The modal closed by whatever means: hide it and unmount the form.
    fn after_close(&mut self) {
        self.modal.page().set_overlay_visible(false);
        if self.form.take().is_some() {
            debug!("content form unmounted");
        }
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    static RAF: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| app.borrow_mut().as_mut().map(f))
}

fn form_handle() -> Option<Weak<RefCell<ContentForm>>> {
    with_app(|app| app.form.as_ref().map(Rc::downgrade)).flatten()
}

/// Tell the page the form changed. Never call while `APP` is borrowed: the
/// callback reads `form_state`.
fn notify() {
    let callback = APP.with(|app| app.borrow().as_ref().and_then(|a| a.on_change.clone()));
    if let Some(callback) = callback {
        let _ = callback.call0(&JsValue::NULL);
    }
}

/// Notify after the tasks spawned so far have reached their first await.
fn notify_soon() {
    spawn_local(async { notify() });
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Shows the confirmation before the delay starts.
struct NotifyThenSleep;

impl Sleeper for NotifyThenSleep {
    async fn sleep_ms(&self, ms: u64) {
        notify();
        TimeoutSleeper.sleep_ms(ms).await;
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    logging::init(Level::INFO);
    Ok(())
}

/// Mount the viewer on `#globe-canvas`. `config_json` may be empty for the
/// defaults. Mounting again replaces the previous viewer.
#[wasm_bindgen]
pub fn mount(config_json: &str) -> Result<(), JsValue> {
    unmount();

    let config = if config_json.trim().is_empty() {
        ViewerConfig::default()
    } else {
        ViewerConfig::from_json_str(config_json).map_err(js_err)?
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document missing"))?;

    let textures = Rc::new(RefCell::new(TextureCache::new()));
    let view = GlobeView::new(
        &config.scene,
        textures.clone(),
        WgpuSink::new(textures.clone()),
    )
    .map_err(js_err)?;
    let uris: Vec<String> = view.scene().texture_uris().map(str::to_string).collect();
    let star_count = config.scene.lighting.star_count;

    let mut render_loop = RenderLoop::new(view);
    render_loop.start();

    let page = DomPage::new(document, OverlayIds::default(), on_modal_keydown);
    page.set_overlay_visible(false);

    APP.with(|app| {
        *app.borrow_mut() = Some(App {
            config,
            render_loop,
            modal: Modal::new(page),
            form: None,
            on_change: None,
            raf_id: None,
        });
    });

    for uri in uris {
        let textures = textures.clone();
        spawn_local(async move {
            load_texture(&textures, &GlooHttp, &uri).await;
        });
    }

    spawn_local(async move {
        match init_wgpu_from_canvas_id(CANVAS_ID, star_count).await {
            Ok(ctx) => {
                let attached = with_app(|app| {
                    app.view_mut().map(|view| view.sink_mut().attach(ctx)).is_some()
                });
                if attached != Some(true) {
                    debug!("viewer unmounted before the gpu context was ready");
                }
            }
            Err(err) => warn!(error = ?err, "wgpu init failed"),
        }
    });

    schedule_frame();
    info!("viewer mounted");
    Ok(())
}

/// Stop the loop, release textures and listeners, and forget the form.
#[wasm_bindgen]
pub fn unmount() {
    let Some(mut app) = APP.with(|app| app.borrow_mut().take()) else {
        return;
    };
    if let (Some(id), Some(window)) = (app.raf_id.take(), web_sys::window()) {
        let _ = window.cancel_animation_frame(id);
    }
    app.render_loop.stop();
    app.modal.close();
    app.after_close();
    drop(app);
    RAF.with(|raf| raf.borrow_mut().take());
    info!("viewer unmounted");
}

fn schedule_frame() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let requested = RAF.with(|raf| {
        let mut raf = raf.borrow_mut();
        let callback = raf.get_or_insert_with(|| Closure::new(on_animation_frame));
        window.request_animation_frame(callback.as_ref().unchecked_ref())
    });
    match requested {
        Ok(id) => {
            with_app(|app| app.raf_id = Some(id));
        }
        Err(err) => warn!(error = ?err, "requestAnimationFrame failed"),
    }
}

fn on_animation_frame(now_ms: f64) {
    let running = with_app(|app| {
        app.raf_id = None;
        app.render_loop.tick(Time::from_millis(now_ms)).is_some()
    });
    if running == Some(true) {
        schedule_frame();
    }
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) {
    with_app(|app| {
        if let Some(view) = app.view_mut() {
            view.set_viewport(width, height);
            view.sink_mut().resize(width as u32, height as u32);
        }
    });
}

#[wasm_bindgen]
pub fn pointer_down(x_px: f64, y_px: f64, button: i16) {
    with_app(|app| {
        if let Some(view) = app.view_mut() {
            view.pointer_down([x_px, y_px], PointerButton::from_dom(button));
        }
    });
}

#[wasm_bindgen]
pub fn pointer_move(x_px: f64, y_px: f64) {
    with_app(|app| {
        if let Some(view) = app.view_mut() {
            view.pointer_move([x_px, y_px]);
        }
    });
}

#[wasm_bindgen]
pub fn pointer_up() {
    with_app(|app| {
        if let Some(view) = app.view_mut() {
            view.pointer_up();
        }
    });
}

#[wasm_bindgen]
pub fn wheel(delta_y: f64) {
    with_app(|app| {
        if let Some(view) = app.view_mut() {
            view.wheel(delta_y);
        }
    });
}

/// 0..=100 while the loading indicator is up.
#[wasm_bindgen]
pub fn loading_percent() -> u8 {
    with_app(|app| app.render_loop.handler().map(|v| v.loading().percent()))
        .flatten()
        .unwrap_or(100)
}

/// Called with no arguments whenever the form state changes.
#[wasm_bindgen]
pub fn set_on_change(callback: js_sys::Function) {
    with_app(|app| app.on_change = Some(callback));
}

#[wasm_bindgen]
pub fn open_overlay() {
    let locate_now = with_app(|app| {
        if app.modal.is_open() {
            return false;
        }
        app.modal.page().set_overlay_visible(true);
        app.modal.open();
        app.form = Some(Rc::new(RefCell::new(ContentForm::new(
            app.config.overlay.clone(),
        ))));
        app.config.overlay.locate_on_mount
    });
    if locate_now == Some(true) {
        use_my_location();
    }
    notify();
}

#[wasm_bindgen]
pub fn close_overlay() {
    with_app(|app| {
        app.modal.close();
        app.after_close();
    });
    notify();
}

/// Route a click. Clicks inside the panel must pass `false`.
#[wasm_bindgen]
pub fn overlay_click(on_backdrop: bool) {
    let target = if on_backdrop {
        ClickTarget::Backdrop
    } else {
        ClickTarget::Content
    };
    let closed = with_app(|app| {
        let closed = app.modal.on_click(target);
        if closed {
            app.after_close();
        }
        closed
    });
    if closed == Some(true) {
        notify();
    }
}

fn on_modal_keydown(event: &web_sys::KeyboardEvent) {
    let key = Key::from_dom(&event.key(), event.shift_key());
    match key {
        // Closing drops this listener; let the handler return first.
        Key::Escape => spawn_local(async {
            let closed = with_app(|app| {
                let closed = app.modal.on_key(Key::Escape) == KeyOutcome::Closed;
                if closed {
                    app.after_close();
                }
                closed
            });
            if closed == Some(true) {
                notify();
            }
        }),
        Key::Tab { .. } => {
            if with_app(|app| app.modal.on_key(key)) == Some(KeyOutcome::FocusWrapped) {
                event.prevent_default();
            }
        }
        Key::Other => {}
    }
}

fn edit_form(edit: impl FnOnce(&mut ContentForm)) {
    let Some(form) = form_handle().and_then(|weak| weak.upgrade()) else {
        return;
    };
    edit(&mut form.borrow_mut());
    drop(form);
    notify();
}

#[wasm_bindgen]
pub fn set_content_kind(kind: &str) -> Result<(), JsValue> {
    let kind = ContentKind::parse(kind)
        .ok_or_else(|| JsValue::from_str(&format!("unknown content kind {kind:?}")))?;
    edit_form(|form| form.set_kind(kind));
    Ok(())
}

#[wasm_bindgen]
pub fn set_message(message: String) {
    edit_form(|form| form.set_message(message));
}

#[wasm_bindgen]
pub fn set_description(description: String) {
    edit_form(|form| form.set_description(description));
}

#[wasm_bindgen]
pub fn set_link(link: String) {
    edit_form(|form| form.set_link(link));
}

/// Both halves set a typed-in position, neither clears it.
#[wasm_bindgen]
pub fn set_manual_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), JsValue> {
    let coords = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        (None, None) => None,
        _ => return Err(JsValue::from_str("latitude and longitude must be given together")),
    };
    let Some(form) = form_handle().and_then(|weak| weak.upgrade()) else {
        return Ok(());
    };
    let outcome = form.borrow_mut().set_manual_coordinates(coords);
    drop(form);
    notify();
    outcome.map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn use_my_location() {
    let Some(form) = form_handle() else {
        return;
    };
    spawn_local(async move {
        if locate(&form, &BrowserPosition, &GlooHttp).await {
            notify();
        }
    });
    notify_soon();
}

#[wasm_bindgen]
pub fn attach_file(file: web_sys::File) {
    let Some(form) = form_handle() else {
        return;
    };
    let file = BrowserFile(file);
    let selected = file.selected();
    spawn_local(async move {
        if attach_media(&form, selected, &file).await {
            notify();
        }
    });
    notify_soon();
}

#[wasm_bindgen]
pub fn remove_attachment() {
    edit_form(|form| {
        form.remove_attachment();
    });
}

#[wasm_bindgen]
pub fn submit_content() {
    let Some(form) = form_handle() else {
        return;
    };
    spawn_local(async move {
        match submit(&form, &GlooHttp, &NotifyThenSleep).await {
            Ok(state) => debug!(?state, "submission settled"),
            Err(refused) => debug!(?refused, "submission refused"),
        }
        notify();
    });
    notify_soon();
}

/// The mounted form as JSON, `null` while the overlay is closed.
#[wasm_bindgen]
pub fn form_state() -> String {
    form_handle()
        .and_then(|weak| weak.upgrade())
        .map(|form| FormView::of(&form.borrow()).to_json())
        .unwrap_or_else(|| "null".to_string())
}
