//! Explicit application state. Controllers take `&mut AppState`; the
//! renderer only ever sees a [`RenderSnapshot`].

use compute::join::{DataJoin, DecayRates, YearSlice};
use formats::{DisasterEvent, FeatureCollection, FormulaSheet, MapManifest, TimeSeriesRow};
use foundation::color::Rgb;
use foundation::math::{GeoProjection, ProjectionKind, Vec2};
use foundation::time::YearRange;
use layers::{
    CategoryFilter, ChoroplethLayer, ChoroplethSnapshot, Colorizer, Layer, LayerId, LegendEntry,
    PointLayer, PointSnapshot, draw_order,
};
use prefs::CategoryToggles;
use runtime::{EventBus, Frame, Scheduler};
use scene::{FillOverrides, NameResolver, ProjectedMap, RegionWorld};
use viewport::{ArcOverlay, FRAME_TASK_LABEL, ViewportEngine, ViewportTransform, ZoomTarget};

use crate::error::LoadError;
use crate::timeline::{TIMELINE_TASK_LABEL, Timeline};
use crate::tooltip::Tooltip;

/// Inset between the fitted map and the canvas edge.
pub const MAP_MARGIN: f64 = 8.0;
pub const VALUE_LABEL: &str = "Value";

pub const CHOROPLETH_LAYER_ID: LayerId = LayerId(1);
pub const POINT_LAYER_ID: LayerId = LayerId(2);

pub const UNRESOLVED_SERIES: &str = "unresolved-series";
pub const UNHANDLED_TASK: &str = "unhandled-task";
pub const TOGGLE_SAVE_FAILED: &str = "toggle-save-failed";

/// Everything fetched at startup. Only `geometry` is required.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub geometry: FeatureCollection,
    pub series: Vec<TimeSeriesRow>,
    pub events: Vec<DisasterEvent>,
    pub formula: Option<FormulaSheet>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HoverTarget {
    Region(usize),
    /// Index into the point layer's events.
    Point(usize),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct DragState {
    pub last: Vec2,
    /// Total pointer travel since the button went down, in pixels.
    pub travel: f64,
}

/// What one render pass draws.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub width: f64,
    pub height: f64,
    pub transform: ViewportTransform,
    /// Layer ids, lowest z first.
    pub layer_order: Vec<LayerId>,
    pub choropleth: ChoroplethSnapshot,
    pub points: PointSnapshot,
    pub point_radius: f64,
    pub overlay: Option<ArcOverlay>,
    pub hovered: Option<HoverTarget>,
    pub focused: Option<usize>,
    pub legend: Vec<LegendEntry>,
    pub year: i32,
    pub playing: bool,
    pub tooltip: Option<(Tooltip, Vec2)>,
}

pub struct AppState {
    pub manifest: MapManifest,
    pub(crate) world: RegionWorld,
    pub(crate) projected: ProjectedMap,
    pub(crate) join: DataJoin,
    pub(crate) slice: YearSlice,
    pub(crate) colorizer: Colorizer,
    pub(crate) choropleth: ChoroplethLayer,
    pub(crate) points: PointLayer,
    pub(crate) visible_points: PointSnapshot,
    pub(crate) toggles: CategoryToggles,
    pub(crate) filter: CategoryFilter,
    pub(crate) engine: ViewportEngine,
    pub(crate) scheduler: Scheduler,
    pub(crate) fills: FillOverrides,
    pub(crate) timeline: Timeline,
    pub(crate) hover: Option<HoverTarget>,
    pub(crate) cursor: Option<Vec2>,
    pub(crate) drag: Option<DragState>,
    pub(crate) suppress_click: bool,
    pub(crate) bus: EventBus,
    pub(crate) formula: Option<FormulaSheet>,
    pub(crate) frame: Frame,
}

impl AppState {
    pub fn new(
        manifest: MapManifest,
        data: LoadedData,
        width: f64,
        height: f64,
        toggles: CategoryToggles,
    ) -> Result<Self, LoadError> {
        let mut resolver = NameResolver::new(manifest.map_kind);
        if !data.series.is_empty() {
            let known: Vec<_> = data
                .series
                .iter()
                .filter_map(|row| resolver.canonicalize(&row.region))
                .collect();
            resolver = resolver.with_known_ids(known);
        }

        let frame = Frame::new(0, 0.0);
        let mut bus = EventBus::new();
        let world = RegionWorld::from_features(&data.geometry, &resolver, frame, &mut bus);
        if world.is_empty() {
            return Err(LoadError::MissingGeometry);
        }

        let range = YearRange::new(manifest.years.min, manifest.years.max);
        let decay = DecayRates::from_config(&manifest.decay, &resolver);
        let join = DataJoin::from_series(&data.series, &resolver, range, &decay);
        if join.unresolved > 0 {
            bus.emit(frame, UNRESOLVED_SERIES, format!("{} rows", join.unresolved));
        }

        let projection = fit_projection(&manifest, &world, width, height);
        let projected = ProjectedMap::build(&world, projection, width, height);
        let mut points = PointLayer::new(POINT_LAYER_ID.0, data.events);
        points.project(&projection);

        let filter = CategoryFilter::from_toggles(toggles.iter());
        let timeline = Timeline::new(range, manifest.timeline.autoplay_budget_ms);
        let slice = join.select_year(timeline.current_year());
        let visible_points = points.extract(timeline.current_year(), &filter);

        tracing::info!(
            "map ready: {} regions, {} joined series, {} events",
            world.len(),
            join.len(),
            points.len()
        );

        Ok(Self {
            colorizer: Colorizer::new(&manifest.colors),
            choropleth: ChoroplethLayer::new(CHOROPLETH_LAYER_ID.0),
            engine: ViewportEngine::new(width, height, manifest.viewport, manifest.animation),
            manifest,
            world,
            projected,
            join,
            slice,
            points,
            visible_points,
            toggles,
            filter,
            scheduler: Scheduler::new(),
            fills: FillOverrides::new(),
            timeline,
            hover: None,
            cursor: None,
            drag: None,
            suppress_click: false,
            bus,
            formula: data.formula,
            frame,
        })
    }

    pub fn projected(&self) -> &ProjectedMap {
        &self.projected
    }

    pub fn engine(&self) -> &ViewportEngine {
        &self.engine
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The frame most recently driven by [`AppState::tick`].
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn formula(&self) -> Option<&FormulaSheet> {
        self.formula.as_ref()
    }

    pub fn toggles(&self) -> &CategoryToggles {
        &self.toggles
    }

    pub fn visible_points(&self) -> &PointSnapshot {
        &self.visible_points
    }

    pub fn hover(&self) -> Option<HoverTarget> {
        self.hover
    }

    /// Sorted categories with their swatch color and enabled flag.
    pub fn categories(&self) -> Vec<(String, Rgb, bool)> {
        self.points
            .categories()
            .into_iter()
            .filter_map(|c| {
                let color = self.points.color_for(c)?;
                Some((c.to_string(), color, self.filter.is_active(c)))
            })
            .collect()
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.engine.set_reduced_motion(reduced);
    }

    pub fn current_year(&self) -> i32 {
        self.timeline.current_year()
    }

    /// Recomputes the year slice and visible points after a year change.
    pub(crate) fn refresh_year(&mut self, year: i32) {
        self.slice = self.join.select_year(year);
        self.refresh_points();
    }

    pub(crate) fn refresh_points(&mut self) {
        self.visible_points = self.points.extract(self.timeline.current_year(), &self.filter);
        if let Some(HoverTarget::Point(i)) = self.hover {
            if !self.visible_points.indices().any(|v| v == i) {
                self.hover = None;
            }
        }
    }

    /// Slider input. Returns `true` if the selected year changed.
    pub fn set_year(&mut self, year: i32) -> bool {
        match self.timeline.set_year(year) {
            Some(year) => {
                self.refresh_year(year);
                true
            }
            None => false,
        }
    }

    pub fn play(&mut self, now_ms: f64) -> bool {
        let before = self.timeline.current_year();
        let started = self.timeline.play(now_ms, &mut self.scheduler);
        if self.timeline.current_year() != before {
            self.refresh_year(self.timeline.current_year());
        }
        started
    }

    pub fn pause(&mut self) -> bool {
        self.timeline.pause(&mut self.scheduler)
    }

    /// Data-driven fill currently drawn for `region`, before overrides.
    pub(crate) fn base_fill(&mut self, region: usize) -> Rgb {
        let scale = self.colorizer.scale_for(&self.join, &self.slice);
        let value = self
            .world
            .get(region)
            .and_then(|r| r.id.as_ref().and_then(|id| self.slice.lookup(Some(id), &r.name)));
        scale.color_for(value)
    }

    pub(crate) fn zoom_target(&mut self, region: usize) -> Option<ZoomTarget> {
        let projected = self.projected.get(region)?;
        let bounds = projected.bounds;
        let centroid = projected.centroid.unwrap_or_else(|| bounds.center());
        Some(ZoomTarget {
            region,
            centroid,
            bounds,
            base_fill: self.base_fill(region),
        })
    }

    /// Runs every task due at `now_ms`. Returns `true` if anything visible
    /// changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.frame = self.frame.next(now_ms);
        let mut dirty = false;
        for fired in self.scheduler.poll(now_ms) {
            match fired.label {
                FRAME_TASK_LABEL => {
                    dirty |= self.engine.on_frame(
                        fired.id,
                        now_ms,
                        &mut self.scheduler,
                        &mut self.fills,
                    );
                }
                TIMELINE_TASK_LABEL => {
                    if let Some(year) = self.timeline.on_tick(fired.id, &mut self.scheduler) {
                        self.refresh_year(year);
                        dirty = true;
                    }
                }
                other => {
                    tracing::debug!("no handler for task {other}");
                    self.bus.emit(self.frame, UNHANDLED_TASK, other);
                }
            }
        }
        dirty
    }

    /// Canvas size change: refits the projection and drops any animation.
    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width > 0.0 && height > 0.0) {
            return;
        }
        self.engine.cancel(&mut self.scheduler, &mut self.fills);
        let projection = fit_projection(&self.manifest, &self.world, width, height);
        self.projected = ProjectedMap::build(&self.world, projection, width, height);
        self.points.project(&projection);
        self.engine.resize(width, height);
        self.refresh_points();
    }

    pub fn snapshot(&mut self) -> RenderSnapshot {
        let scale = self.colorizer.scale_for(&self.join, &self.slice);
        let choropleth = self
            .choropleth
            .extract(&self.world, &self.slice, scale, &self.fills);
        let legend = scale.legend();
        let stack: [&dyn Layer; 2] = [&self.choropleth, &self.points];
        RenderSnapshot {
            width: self.projected.width,
            height: self.projected.height,
            transform: self.engine.transform(),
            layer_order: draw_order(&stack),
            choropleth,
            points: self.visible_points.clone(),
            point_radius: self.points.radius,
            overlay: self.engine.overlay().copied(),
            hovered: self.hover,
            focused: self.engine.focused_region(),
            legend,
            year: self.timeline.current_year(),
            playing: self.timeline.is_playing(),
            tooltip: self.tooltip().zip(self.cursor),
        }
    }
}

fn fit_projection(manifest: &MapManifest, world: &RegionWorld, width: f64, height: f64) -> GeoProjection {
    GeoProjection::fit_extent(
        ProjectionKind::from_str(&manifest.projection),
        &world.lon_lat_bounds(),
        width,
        height,
        MAP_MARGIN,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{
        AppState, CHOROPLETH_LAYER_ID, HoverTarget, LoadedData, POINT_LAYER_ID, UNHANDLED_TASK,
    };
    use crate::error::LoadError;
    use crate::timeline::TIMELINE_TASK_LABEL;
    use formats::{DisasterEvent, FeatureCollection, MapManifest, TimeSeriesRow, YearsConfig};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use prefs::{CategoryToggles, InMemoryTogglesStore, load_or_default};
    use std::collections::BTreeMap;
    use viewport::FRAME_TASK_LABEL;

    pub(crate) const TWO_SQUARES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"ISO_A3":"AAA","NAME":"Alpha"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
        {"type":"Feature","properties":{"ISO_A3":"BBB","NAME":"Beta"},
         "geometry":{"type":"Polygon","coordinates":[[[20,0],[30,0],[30,10],[20,10],[20,0]]]}}]}"#;

    fn row(region: &str, year: i32, value: f64) -> TimeSeriesRow {
        TimeSeriesRow {
            region: region.to_string(),
            name: None,
            year,
            value,
        }
    }

    fn event(category: &str, year: i32, lon: f64, lat: f64) -> DisasterEvent {
        DisasterEvent {
            category: category.to_string(),
            year: Some(year),
            lon_deg: lon,
            lat_deg: lat,
            fields: BTreeMap::new(),
        }
    }

    pub(crate) fn manifest() -> MapManifest {
        MapManifest {
            years: YearsConfig {
                min: 2000,
                max: 2003,
            },
            ..MapManifest::default()
        }
    }

    pub(crate) fn state_with(toggles: CategoryToggles) -> AppState {
        let data = LoadedData {
            geometry: FeatureCollection::from_geojson_str(TWO_SQUARES).unwrap(),
            series: vec![row("AAA", 2000, 10.0), row("BBB", 2000, 20.0), row("BBB", 2002, 40.0)],
            events: vec![
                event("Flood", 2000, 5.0, 5.0),
                event("Storm", 2000, 25.0, 5.0),
                event("Flood", 2001, 6.0, 6.0),
            ],
            formula: None,
        };
        let mut m = manifest();
        m.timeline.autoplay_budget_ms = 400.0;
        AppState::new(m, data, 800.0, 600.0, toggles).unwrap()
    }

    pub(crate) fn state() -> AppState {
        state_with(CategoryToggles::default())
    }

    pub(crate) fn centroid(state: &AppState, region: usize) -> Vec2 {
        state.projected().get(region).unwrap().centroid.unwrap()
    }

    /// Pumps frames until the scripted animation finishes.
    pub(crate) fn run_animation(state: &mut AppState, mut now: f64) -> f64 {
        for _ in 0..1000 {
            if !state.engine().is_animating() {
                break;
            }
            now += 16.0;
            state.tick(now);
        }
        assert!(!state.engine().is_animating());
        now
    }

    #[test]
    fn clicking_same_region_twice_returns_to_identity() {
        let mut s = state();
        let c = centroid(&s, 0);
        assert!(s.click(c, 0.0));
        assert_eq!(s.scheduler().pending_with_label(FRAME_TASK_LABEL), 1);
        let now = run_animation(&mut s, 0.0);

        assert_eq!(s.engine().focused_region(), Some(0));
        let t = s.engine().transform();
        assert_eq!(t.k, s.manifest.viewport.focus_scale);
        assert!(s.fills.is_empty());

        let on_screen = t.apply(c);
        assert!(s.click(on_screen, now));
        run_animation(&mut s, now);
        assert!(s.engine().transform().is_identity(1e-9));
        assert_eq!(s.engine().focused_region(), None);
        assert!(s.engine().overlay().is_none());
        assert_eq!(s.scheduler().pending_frames(), 0);
    }

    #[test]
    fn second_click_mid_flight_keeps_one_frame_task() {
        let mut s = state();
        let (a, b) = (centroid(&s, 0), centroid(&s, 1));
        s.click(a, 0.0);
        s.tick(16.0);
        s.tick(32.0);
        let t = s.engine().transform();
        s.click(t.apply(b), 40.0);
        assert_eq!(s.scheduler().pending_frames(), 1);
        assert_eq!(s.engine().focused_region(), Some(1));
        run_animation(&mut s, 40.0);
        assert!(s.fills.is_empty());
    }

    #[test]
    fn toggling_a_category_hides_and_restores_its_points() {
        let mut s = state();
        let mut store = InMemoryTogglesStore::new();
        assert_eq!(s.visible_points().marks.len(), 2);

        assert!(!s.toggle_category("Flood", &mut store));
        let shown: Vec<usize> = s.visible_points().indices().collect();
        assert_eq!(shown, vec![1]);
        assert!(!load_or_default(&store).is_enabled("Flood"));

        assert!(s.toggle_category("Flood", &mut store));
        let shown: Vec<usize> = s.visible_points().indices().collect();
        assert_eq!(shown, vec![0, 1]);
    }

    #[test]
    fn stored_toggles_apply_on_load() {
        let store = InMemoryTogglesStore::with_raw(r#"{"Storm":false}"#);
        let s = state_with(load_or_default(&store));
        let shown: Vec<usize> = s.visible_points().indices().collect();
        assert_eq!(shown, vec![0]);
        let storm = s.categories().into_iter().find(|(c, _, _)| c == "Storm").unwrap();
        assert!(!storm.2);
    }

    #[test]
    fn autoplay_advances_years_and_stops_at_the_end() {
        let mut s = state();
        assert!(s.play(0.0));
        let mut years = Vec::new();
        for step in 1..=6 {
            if s.tick(step as f64 * 100.0) {
                years.push(s.current_year());
            }
        }
        assert_eq!(years, vec![2001, 2002, 2003]);
        assert!(!s.timeline().is_playing());
        assert_eq!(s.scheduler().pending_with_label(TIMELINE_TASK_LABEL), 0);

        // Carried forward from 2002 with decay.
        let snap = s.snapshot();
        assert_eq!(snap.year, 2003);
        assert_eq!(snap.choropleth.get(1).unwrap().value, Some(40.0 * (1.0 - 0.05f64).powi(1)));
    }

    #[test]
    fn slider_is_ignored_while_playing() {
        let mut s = state();
        s.play(0.0);
        assert!(!s.set_year(2002));
        assert_eq!(s.current_year(), 2000);
        s.pause();
        assert!(s.set_year(2002));
        assert_eq!(s.snapshot().year, 2002);
    }

    #[test]
    fn year_change_filters_points_by_year() {
        let mut s = state();
        s.set_year(2001);
        let shown: Vec<usize> = s.visible_points().indices().collect();
        assert_eq!(shown, vec![2]);
    }

    #[test]
    fn hovered_point_cleared_when_hidden() {
        let mut s = state();
        s.hover = Some(HoverTarget::Point(0));
        s.set_year(2001);
        assert_eq!(s.hover(), None);
    }

    #[test]
    fn missing_geometry_is_an_error() {
        let data = LoadedData {
            geometry: FeatureCollection::from_geojson_str(
                r#"{"type":"FeatureCollection","features":[
                    {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}}]}"#,
            )
            .unwrap(),
            ..LoadedData::default()
        };
        let err = AppState::new(manifest(), data, 800.0, 600.0, CategoryToggles::default())
            .err()
            .unwrap();
        assert_eq!(err, LoadError::MissingGeometry);
    }

    #[test]
    fn regions_without_series_render_no_data() {
        let data = LoadedData {
            geometry: FeatureCollection::from_geojson_str(TWO_SQUARES).unwrap(),
            ..LoadedData::default()
        };
        let mut s = AppState::new(manifest(), data, 800.0, 600.0, CategoryToggles::default()).unwrap();
        let snap = s.snapshot();
        assert!(snap.choropleth.fills.iter().all(|f| f.value.is_none()));
        assert!(snap.points.marks.is_empty());
    }

    #[test]
    fn choropleth_draws_below_points() {
        let mut s = state();
        assert_eq!(s.snapshot().layer_order, vec![CHOROPLETH_LAYER_ID, POINT_LAYER_ID]);
    }

    #[test]
    fn diagnostics_carry_the_frame_index() {
        let mut s = state();
        s.tick(16.0);
        s.scheduler.request_frame("overlay.refresh");
        s.tick(32.0);
        assert_eq!(s.frame().index, 2);
        let event = s
            .bus()
            .events()
            .iter()
            .find(|e| e.kind == UNHANDLED_TASK)
            .unwrap();
        assert_eq!(event.frame_index, 2);
        assert_eq!(event.message, "overlay.refresh");
    }
}
