//! Browser front end: wasm exports called by the host page, which owns the
//! `requestAnimationFrame` loop and forwards pointer and control events.

use std::cell::RefCell;

use console_error_panic_hook::set_once;
use formats::{
    DomIds, FeatureCollection, FormatError, FormulaSheet, MapManifest, Table, events_from_table,
    rows_from_table,
};
use foundation::math::Vec2;
use gloo_net::http::Request;
use layers::{LayerStyle, LegendEntry};
use prefs::{InMemoryTogglesStore, LocalStorageTogglesStore, TogglesStore, load_or_default};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub mod dom;
pub mod error;
pub mod interaction;
pub mod logging;
pub mod render;
pub mod state;
pub mod timeline;
pub mod tooltip;

use error::LoadError;
use state::{AppState, HoverTarget, LoadedData};

/// Browser storage when available, otherwise toggles live for the session.
enum ToggleStore {
    Local(LocalStorageTogglesStore),
    Memory(InMemoryTogglesStore),
}

impl Default for ToggleStore {
    fn default() -> Self {
        ToggleStore::Memory(InMemoryTogglesStore::new())
    }
}

impl ToggleStore {
    fn open(key: &str) -> Self {
        match LocalStorageTogglesStore::new(key) {
            Ok(store) => ToggleStore::Local(store),
            Err(e) => {
                tracing::warn!("category toggles will not persist: {e}");
                ToggleStore::default()
            }
        }
    }

    fn as_store(&self) -> &dyn TogglesStore {
        match self {
            ToggleStore::Local(s) => s,
            ToggleStore::Memory(s) => s,
        }
    }

    fn as_store_mut(&mut self) -> &mut dyn TogglesStore {
        match self {
            ToggleStore::Local(s) => s,
            ToggleStore::Memory(s) => s,
        }
    }
}

#[derive(Default)]
struct WebApp {
    state: Option<AppState>,
    canvas: Option<HtmlCanvasElement>,
    ctx: Option<CanvasRenderingContext2d>,
    store: ToggleStore,
    style: LayerStyle,
    ids: DomIds,
    /// Last values pushed to the side panels; avoids DOM churn per frame.
    shown_legend: Option<Vec<LegendEntry>>,
    shown_timeline: Option<(i32, bool)>,
}

thread_local! {
    static APP: RefCell<WebApp> = RefCell::new(WebApp::default());
}

/// TLS access that degrades to a default during teardown or re-entrancy
/// instead of panicking.
fn with_app<F, R>(f: F) -> R
where
    F: FnOnce(&mut WebApp) -> R,
    R: Default,
{
    APP.try_with(|cell| match cell.try_borrow_mut() {
        Ok(mut app) => f(&mut app),
        Err(_) => R::default(),
    })
    .unwrap_or_default()
}

fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
    R: Default,
{
    with_app(|app| app.state.as_mut().map(f).unwrap_or_default())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    logging::init_logging(logging::DEFAULT_FILTER);
    Ok(())
}

/// Fetches the manifest and every data file it lists, then draws the map.
/// Failures land in the page's error box.
#[wasm_bindgen]
pub fn init_map(manifest_url: String) {
    spawn_local(async move {
        if let Err((ids, err)) = load(&manifest_url).await {
            dom::show_error(&ids, &err.to_string());
        }
    });
}

async fn load(manifest_url: &str) -> Result<(), (DomIds, LoadError)> {
    let manifest = fetch_text(manifest_url)
        .await
        .and_then(|text| {
            MapManifest::from_json_str(&text).map_err(|e| LoadError::parse(manifest_url, e))
        })
        .map_err(|e| (DomIds::default(), e))?;
    let ids = manifest.dom.clone();
    load_with(manifest).await.map_err(|e| (ids, e))
}

async fn load_with(manifest: MapManifest) -> Result<(), LoadError> {
    let (canvas, ctx) = canvas_context(&manifest.dom.canvas)
        .map_err(|e| LoadError::Dom(format!("#{} ({e:?})", manifest.dom.canvas)))?;
    let width = f64::from(canvas.client_width().max(1));
    let height = f64::from(canvas.client_height().max(1));
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);

    let sources = manifest.sources.clone();
    let geometry_text = fetch_text(&sources.geometry).await?;
    let geometry = FeatureCollection::from_geojson_str(&geometry_text)
        .map_err(|e| LoadError::parse(&sources.geometry, e))?;

    let series = fetch_optional(sources.series.as_deref(), |text| {
        rows_from_table(&Table::parse(text)?)
    })
    .await
    .unwrap_or_default();
    let events = fetch_optional(sources.events.as_deref(), |text| {
        let parsed = events_from_table(&Table::parse(text)?)?;
        if parsed.skipped > 0 {
            tracing::warn!("{} event rows had unusable coordinates", parsed.skipped);
        }
        Ok(parsed.events)
    })
    .await
    .unwrap_or_default();
    let formula = fetch_optional(sources.formula.as_deref(), FormulaSheet::from_json_str).await;

    let store = ToggleStore::open(&manifest.storage_key);
    let toggles = load_or_default(store.as_store());
    let reduced_motion = manifest.animation.reduced_motion || prefers_reduced_motion();
    let data = LoadedData {
        geometry,
        series,
        events,
        formula,
    };
    let mut state = AppState::new(manifest, data, width, height, toggles)?;
    state.set_reduced_motion(reduced_motion);

    with_app(|app| {
        app.ids = state.manifest.dom.clone();
        app.canvas = Some(canvas);
        app.ctx = Some(ctx);
        app.store = store;
        app.shown_legend = None;
        app.shown_timeline = None;
        if let Err(e) = dom::render_formula(&app.ids, state.formula()) {
            tracing::warn!("formula panel: {e:?}");
        }
        if let Err(e) = dom::render_filters(&app.ids, &state.categories()) {
            tracing::warn!("category filters: {e:?}");
        }
        app.state = Some(state);
        redraw(app);
    });
    Ok(())
}

async fn fetch_text(url: &str) -> Result<String, LoadError> {
    let resp = Request::get(url).send().await.map_err(|e| LoadError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if !resp.ok() {
        return Err(LoadError::Http {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    resp.text().await.map_err(|e| LoadError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Optional inputs degrade to `None` with a warning.
async fn fetch_optional<T>(
    url: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, FormatError>,
) -> Option<T> {
    let url = url?;
    let text = match fetch_text(url).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{e}");
            return None;
        }
    };
    match parse(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}", LoadError::parse(url, e));
            None
        }
    }
}

fn canvas_context(id: &str) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let doc = dom::document()?;
    let canvas = dom::element(&doc, id)?.dyn_into::<HtmlCanvasElement>()?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((canvas, ctx))
}

fn prefers_reduced_motion() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
        .is_some_and(|mq| mq.matches())
}

fn redraw(app: &mut WebApp) {
    let (Some(state), Some(ctx)) = (app.state.as_mut(), app.ctx.as_ref()) else {
        return;
    };
    let snap = state.snapshot();
    if let Err(e) = render::render_map(ctx, state.projected(), &snap, &app.style) {
        tracing::warn!("render failed: {e:?}");
    }

    let viewport = Vec2::new(snap.width, snap.height);
    if let Err(e) = dom::update_tooltip(&app.ids, snap.tooltip.as_ref(), viewport) {
        tracing::debug!("tooltip update failed: {e:?}");
    }
    if app.shown_legend.as_ref() != Some(&snap.legend) {
        if let Err(e) = dom::render_legend(&app.ids, &snap.legend) {
            tracing::debug!("legend update failed: {e:?}");
        }
        app.shown_legend = Some(snap.legend);
    }
    let timeline = (snap.year, snap.playing);
    if app.shown_timeline != Some(timeline) {
        let range = state.timeline().range();
        if let Err(e) = dom::update_timeline(&app.ids, range, snap.year, snap.playing) {
            tracing::debug!("timeline update failed: {e:?}");
        }
        app.shown_timeline = Some(timeline);
    }
}

/// Runs `f` on the state and redraws if it reports a change.
fn update(f: impl FnOnce(&mut AppState) -> bool) -> bool {
    with_app(|app| {
        let changed = app.state.as_mut().is_some_and(f);
        if changed {
            redraw(app);
        }
        changed
    })
}

/// Called from the host's animation-frame loop with its timestamp.
#[wasm_bindgen]
pub fn tick(now_ms: f64) -> bool {
    update(|s| s.tick(now_ms))
}

#[wasm_bindgen]
pub fn set_canvas_size(width: f64, height: f64) {
    with_app(|app| {
        if let Some(canvas) = &app.canvas {
            canvas.set_width(width.max(1.0) as u32);
            canvas.set_height(height.max(1.0) as u32);
        }
        if let Some(state) = app.state.as_mut() {
            state.resize(width, height);
        }
        redraw(app);
    });
}

#[wasm_bindgen]
pub fn pointer_move(x: f64, y: f64) -> bool {
    update(|s| s.pointer_move(Vec2::new(x, y)))
}

#[wasm_bindgen]
pub fn pointer_leave() -> bool {
    update(|s| s.pointer_leave())
}

#[wasm_bindgen]
pub fn pointer_down(x: f64, y: f64) {
    with_state(|s| s.pointer_down(Vec2::new(x, y)));
}

#[wasm_bindgen]
pub fn pointer_up() {
    with_state(|s| s.pointer_up());
}

#[wasm_bindgen]
pub fn click(x: f64, y: f64, now_ms: f64) -> bool {
    update(|s| s.click(Vec2::new(x, y), now_ms))
}

#[wasm_bindgen]
pub fn wheel(x: f64, y: f64, delta_y: f64) -> bool {
    update(|s| s.wheel(Vec2::new(x, y), delta_y))
}

#[wasm_bindgen]
pub fn double_click(x: f64, y: f64) -> bool {
    update(|s| s.double_click(Vec2::new(x, y)))
}

#[wasm_bindgen]
pub fn pinch(x: f64, y: f64, factor: f64) -> bool {
    update(|s| s.pinch(Vec2::new(x, y), factor))
}

/// Slider input; ignored while autoplay runs.
#[wasm_bindgen]
pub fn set_year(year: i32) -> bool {
    let changed = update(|s| s.set_year(year));
    if !changed {
        // Snap the slider back to the year actually shown.
        with_app(|app| {
            app.shown_timeline = None;
            redraw(app);
        });
    }
    changed
}

#[wasm_bindgen]
pub fn play(now_ms: f64) -> bool {
    update(|s| s.play(now_ms))
}

#[wasm_bindgen]
pub fn pause() -> bool {
    update(|s| s.pause())
}

/// Play button: starts or stops autoplay.
#[wasm_bindgen]
pub fn toggle_play(now_ms: f64) -> bool {
    update(|s| {
        if s.timeline().is_playing() {
            s.pause()
        } else {
            s.play(now_ms)
        }
    })
}

/// Returns the category's new enabled state.
#[wasm_bindgen]
pub fn toggle_category(category: &str) -> bool {
    with_app(|app| {
        let Some(state) = app.state.as_mut() else {
            return true;
        };
        let enabled = state.toggle_category(category, app.store.as_store_mut());
        if let Err(e) = dom::render_filters(&app.ids, &state.categories()) {
            tracing::debug!("category filters: {e:?}");
        }
        redraw(app);
        enabled
    })
}

#[wasm_bindgen]
pub fn set_reduced_motion(reduced: bool) {
    with_state(|s| s.set_reduced_motion(reduced));
}

#[derive(Debug, Serialize)]
struct DebugState {
    year: i32,
    playing: bool,
    transform: [f64; 3],
    focused: Option<usize>,
    hovered: Option<String>,
    pending_tasks: usize,
    frame: u64,
    /// `(frame index, kind, message)`.
    diagnostics: Vec<(u64, String, String)>,
}

/// JSON summary of the live state for the browser console.
#[wasm_bindgen]
pub fn debug_state() -> String {
    with_state(|s| {
        let t = s.engine().transform();
        let debug = DebugState {
            year: s.current_year(),
            playing: s.timeline().is_playing(),
            transform: [t.x, t.y, t.k],
            focused: s.engine().focused_region(),
            hovered: s.hover().map(|h| match h {
                HoverTarget::Region(i) => format!("region:{i}"),
                HoverTarget::Point(i) => format!("point:{i}"),
            }),
            pending_tasks: s.scheduler().len(),
            frame: s.frame().index,
            diagnostics: s
                .bus()
                .events()
                .iter()
                .map(|e| (e.frame_index, e.kind.to_string(), e.message.clone()))
                .collect(),
        };
        serde_json::to_string(&debug).unwrap_or_default()
    })
}
