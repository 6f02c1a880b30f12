use foundation::math::Vec2;
use prefs::TogglesStore;
use scene::{pick_point, pick_region};

use crate::state::{AppState, DragState, HoverTarget, TOGGLE_SAVE_FAILED, VALUE_LABEL};
use crate::tooltip::{Tooltip, point_tooltip, region_tooltip};

/// Pointer travel (px) after which a press counts as a drag, not a click.
pub const CLICK_SLOP_PX: f64 = 4.0;
/// Extra hit radius around point marks, in screen pixels.
const POINT_HIT_SLOP_PX: f64 = 2.0;

impl AppState {
    /// Hover and drag handling. Returns `true` if a redraw is needed.
    pub fn pointer_move(&mut self, screen: Vec2) -> bool {
        if !screen.is_finite() {
            return false;
        }
        self.cursor = Some(screen);

        if let Some(drag) = self.drag.as_mut() {
            let delta = screen - drag.last;
            drag.last = screen;
            drag.travel += delta.length();
            if drag.travel > CLICK_SLOP_PX {
                return self
                    .engine
                    .pan_by(delta.x, delta.y, &mut self.scheduler, &mut self.fills);
            }
            return false;
        }

        let next = self.hit_test(screen);
        let changed = next != self.hover;
        self.hover = next;
        // The tooltip follows the cursor even when the target is unchanged.
        changed || next.is_some()
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.cursor = None;
        self.drag = None;
        self.hover.take().is_some()
    }

    pub fn pointer_down(&mut self, screen: Vec2) {
        self.drag = Some(DragState {
            last: screen,
            travel: 0.0,
        });
        self.suppress_click = false;
    }

    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.suppress_click = drag.travel > CLICK_SLOP_PX;
        }
    }

    /// Zooms onto the clicked region, or back out when the focused region
    /// (or empty space) is clicked while zoomed. Clicks ending a drag are
    /// ignored.
    pub fn click(&mut self, screen: Vec2, now_ms: f64) -> bool {
        if std::mem::take(&mut self.suppress_click) || !screen.is_finite() {
            return false;
        }
        let map = self.engine.transform().invert(screen);
        let hit = pick_region(&self.projected, map);
        let zoomed = self.engine.focused_region().is_some()
            || !self.engine.transform().is_identity(1e-9);

        match hit {
            Some(region) if self.engine.focused_region() == Some(region) => {
                self.reset_view(now_ms);
                true
            }
            Some(region) => {
                let Some(target) = self.zoom_target(region) else {
                    return false;
                };
                tracing::debug!("zooming to region {region}");
                self.engine
                    .animate_zoom_in(target, now_ms, &mut self.scheduler, &mut self.fills);
                true
            }
            None if zoomed => {
                self.reset_view(now_ms);
                true
            }
            None => false,
        }
    }

    pub fn reset_view(&mut self, now_ms: f64) {
        self.engine
            .animate_reset_to_global(now_ms, &mut self.scheduler, &mut self.fills);
    }

    /// One wheel notch about the cursor. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, screen: Vec2, delta_y: f64) -> bool {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let step = self.engine.zoom_step();
        let factor = if delta_y < 0.0 { step } else { 1.0 / step };
        self.engine
            .zoom_at(screen, factor, &mut self.scheduler, &mut self.fills);
        true
    }

    pub fn double_click(&mut self, screen: Vec2) -> bool {
        let step = self.engine.zoom_step();
        self.engine
            .zoom_at(screen, step, &mut self.scheduler, &mut self.fills);
        true
    }

    /// Two-finger pinch step; `factor` is the ratio of finger spans.
    pub fn pinch(&mut self, center: Vec2, factor: f64) -> bool {
        if !(factor.is_finite() && factor > 0.0) || !center.is_finite() {
            return false;
        }
        self.engine
            .zoom_at(center, factor, &mut self.scheduler, &mut self.fills);
        true
    }

    /// Flips a category, persists the toggles and refilters the points.
    /// Returns the category's new state. Storage failures are logged only.
    pub fn toggle_category(&mut self, category: &str, store: &mut dyn TogglesStore) -> bool {
        let enabled = self.toggles.toggle(category);
        self.filter.set_active(category, enabled);
        if let Err(e) = store.save(&self.toggles) {
            tracing::warn!("could not persist category toggles: {e}");
            self.bus.emit(self.frame, TOGGLE_SAVE_FAILED, e.to_string());
        }
        self.refresh_points();
        enabled
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        match self.hover? {
            HoverTarget::Point(i) => self.points.event(i).map(point_tooltip),
            HoverTarget::Region(i) => {
                let region = self.world.get(i)?;
                let value = region
                    .id
                    .as_ref()
                    .and_then(|id| self.slice.lookup(Some(id), &region.name));
                let label = self.manifest.name.as_deref().unwrap_or(VALUE_LABEL);
                Some(region_tooltip(&region.name, value, self.slice.year, label))
            }
        }
    }

    /// Points win over the regions beneath them.
    fn hit_test(&self, screen: Vec2) -> Option<HoverTarget> {
        let t = self.engine.transform();
        let map = t.invert(screen);
        if !map.is_finite() {
            return None;
        }
        let marks = &self.visible_points.marks;
        let positions: Vec<Vec2> = marks.iter().map(|m| m.position).collect();
        let radius = (self.points.radius + POINT_HIT_SLOP_PX) / t.k;
        if let Some(i) = pick_point(&positions, 0..positions.len(), map, radius) {
            return Some(HoverTarget::Point(marks[i].index));
        }
        pick_region(&self.projected, map).map(HoverTarget::Region)
    }
}

#[cfg(test)]
mod tests {
    use super::CLICK_SLOP_PX;
    use crate::state::{HoverTarget, TOGGLE_SAVE_FAILED};
    use crate::state::tests::{centroid, run_animation, state};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use prefs::{CategoryToggles, PrefsError, TogglesStore};

    #[test]
    fn hover_prefers_points_over_regions() {
        let mut s = state();
        let point = s.visible_points().marks[0].position;
        assert!(s.pointer_move(point));
        assert_eq!(s.hover(), Some(HoverTarget::Point(0)));
        assert_eq!(s.tooltip().unwrap().title, "Flood");

        let near_edge = s.projected().get(1).unwrap().bounds;
        let inside = Vec2::new(near_edge.min[0] + 2.0, near_edge.max[1] - 2.0);
        s.pointer_move(inside);
        assert_eq!(s.hover(), Some(HoverTarget::Region(1)));
        let tip = s.tooltip().unwrap();
        assert_eq!(tip.title, "Beta");
        assert_eq!(tip.rows[1].1, "20");

        assert!(s.pointer_leave());
        assert_eq!(s.tooltip(), None);
    }

    #[test]
    fn click_on_empty_space_resets_when_zoomed() {
        let mut s = state();
        s.wheel(Vec2::new(400.0, 300.0), -1.0);
        assert!(!s.engine().transform().is_identity(1e-9));

        // Above the map strip, open space at this zoom.
        assert!(s.click(Vec2::new(1.0, 1.0), 0.0));
        let now = run_animation(&mut s, 0.0);
        assert!(s.engine().transform().is_identity(1e-9));

        assert!(!s.click(Vec2::new(1.0, 1.0), now));
    }

    #[test]
    fn drag_pans_when_zoomed_and_swallows_the_click() {
        let mut s = state();
        s.wheel(Vec2::new(400.0, 300.0), -1.0);
        s.wheel(Vec2::new(400.0, 300.0), -1.0);
        assert!(s.engine().drag_enabled());
        let before = s.engine().transform();

        s.pointer_down(Vec2::new(400.0, 300.0));
        s.pointer_move(Vec2::new(400.0 + CLICK_SLOP_PX + 1.0, 300.0));
        s.pointer_move(Vec2::new(420.0, 310.0));
        s.pointer_up();
        assert!(!s.click(Vec2::new(420.0, 310.0), 0.0));

        let after = s.engine().transform();
        assert_eq!(after.k, before.k);
        assert!(after.x > before.x);
        assert!(after.y > before.y);
    }

    #[test]
    fn pinch_zooms_about_its_center() {
        let mut s = state();
        assert!(!s.pinch(Vec2::new(400.0, 300.0), 0.0));
        assert!(s.pinch(Vec2::new(400.0, 300.0), 2.0));
        let t = s.engine().transform();
        assert_eq!(t.k, 2.0);
        assert!((t.x + 400.0).abs() < 1e-9 && (t.y + 300.0).abs() < 1e-9);
    }

    #[test]
    fn short_press_still_clicks() {
        let mut s = state();
        let c = centroid(&s, 0);
        s.pointer_down(c);
        s.pointer_move(c + Vec2::new(1.0, 0.0));
        s.pointer_up();
        assert!(s.click(c, 0.0));
        assert_eq!(s.engine().focused_region(), Some(0));
    }

    #[test]
    fn toggle_survives_storage_failure() {
        let mut s = state();
        let mut broken = NoStorage;
        s.tick(16.0);
        s.tick(32.0);
        assert!(!s.toggle_category("Storm", &mut broken));
        let shown: Vec<usize> = s.visible_points().indices().collect();
        assert_eq!(shown, vec![0]);

        let failed: Vec<_> = s
            .bus()
            .events()
            .iter()
            .filter(|e| e.kind == TOGGLE_SAVE_FAILED)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].frame_index, 2);
    }

    struct NoStorage;

    impl TogglesStore for NoStorage {
        fn load(&self) -> Result<Option<CategoryToggles>, PrefsError> {
            Err(PrefsError::StorageUnavailable)
        }

        fn save(&mut self, _toggles: &CategoryToggles) -> Result<(), PrefsError> {
            Err(PrefsError::StorageUnavailable)
        }
    }
}
