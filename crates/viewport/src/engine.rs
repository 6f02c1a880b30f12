use formats::{AnimationConfig, ViewportConfig};
use foundation::bounds::Aabb2;
use foundation::color::Rgb;
use foundation::math::Vec2;
use runtime::{Scheduler, TaskId};
use scene::overrides::FillOverrides;

use crate::animation::{
    AnimationKind, AnimationPhase, AnimationTimings, ZoomAnimation,
};
use crate::arc::CubicBezier;
use crate::transform::{ViewportBounds, ViewportTransform};

pub const FRAME_TASK_LABEL: &str = "viewport.frame";
pub const FLASH_COLOR: Rgb = Rgb::new(0xff, 0xd7, 0x00);

/// Region to zoom onto, in map coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomTarget {
    pub region: usize,
    pub centroid: Vec2,
    pub bounds: Aabb2,
    /// Fill currently drawn for the region; restored after the flash.
    pub base_fill: Rgb,
}

/// The arc drawn while an animation runs. `progress` is the drawn fraction,
/// starting at `p0` (or at `p3` when `reverse`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcOverlay {
    pub path: CubicBezier,
    pub progress: f64,
    pub reverse: bool,
}

impl ArcOverlay {
    /// Parameter range of the visible part of the path.
    pub fn visible_range(&self) -> (f64, f64) {
        let p = self.progress.clamp(0.0, 1.0);
        if self.reverse { (1.0 - p, 1.0) } else { (0.0, p) }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AnimationHandle(u64);

/// Owns the live transform plus at most one scripted animation, one pending
/// frame task and one arc overlay.
///
/// Every mutation goes through [`ViewportBounds::clamp`].
#[derive(Debug)]
pub struct ViewportEngine {
    bounds: ViewportBounds,
    viewport: ViewportConfig,
    animation: AnimationConfig,
    transform: ViewportTransform,
    active: Option<(AnimationHandle, ZoomAnimation)>,
    frame_task: Option<TaskId>,
    overlay: Option<ArcOverlay>,
    focus: Option<ZoomTarget>,
    flashing: bool,
    next_handle: u64,
}

impl ViewportEngine {
    pub fn new(width: f64, height: f64, viewport: ViewportConfig, animation: AnimationConfig) -> Self {
        Self {
            bounds: ViewportBounds::from_config(width, height, &viewport),
            viewport,
            animation,
            transform: ViewportTransform::IDENTITY,
            active: None,
            frame_task: None,
            overlay: None,
            focus: None,
            flashing: false,
            next_handle: 1,
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn bounds(&self) -> &ViewportBounds {
        &self.bounds
    }

    pub fn overlay(&self) -> Option<&ArcOverlay> {
        self.overlay.as_ref()
    }

    pub fn focus(&self) -> Option<&ZoomTarget> {
        self.focus.as_ref()
    }

    pub fn focused_region(&self) -> Option<usize> {
        self.focus.map(|f| f.region)
    }

    pub fn frame_task(&self) -> Option<TaskId> {
        self.frame_task
    }

    pub fn phase(&self) -> AnimationPhase {
        self.active
            .as_ref()
            .map(|(_, a)| a.phase())
            .unwrap_or(AnimationPhase::Idle)
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_active(&self, handle: AnimationHandle) -> bool {
        matches!(&self.active, Some((h, _)) if *h == handle)
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.animation.reduced_motion = reduced;
    }

    pub fn drag_enabled(&self) -> bool {
        self.transform.k >= self.viewport.drag_min_scale
    }

    pub fn zoom_step(&self) -> f64 {
        self.viewport.zoom_step
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.bounds = ViewportBounds::from_config(width, height, &self.viewport);
        self.transform = self.bounds.clamp(self.transform);
    }

    fn apply(&mut self, t: ViewportTransform) {
        self.transform = self.bounds.clamp(t);
    }

    /// Centers `centroid` (map coordinates) at `scale`, no animation.
    pub fn set_transform_instant(&mut self, centroid: Vec2, scale: f64) {
        if !centroid.is_finite() {
            tracing::debug!("instant transform with non-finite centroid; keeping scale only");
            let k = self.bounds.clamp_scale(scale);
            self.apply(ViewportTransform { k, ..self.transform });
            return;
        }
        let t = ViewportTransform::centered_on(centroid, scale, self.bounds.center());
        self.apply(t);
    }

    fn allocate_handle(&mut self) -> AnimationHandle {
        let h = AnimationHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn start(&mut self, anim: ZoomAnimation, scheduler: &mut Scheduler) -> AnimationHandle {
        let handle = self.allocate_handle();
        self.overlay = Some(ArcOverlay {
            path: anim.path,
            progress: 0.0,
            reverse: anim.reverse,
        });
        self.frame_task = Some(scheduler.request_frame(FRAME_TASK_LABEL));
        self.active = Some((handle, anim));
        handle
    }

    /// Zooms onto `target` along an arc. Cancels any running animation
    /// first. Falls back to an instant move (returning `None`) under reduced
    /// motion or for degenerate geometry.
    pub fn animate_zoom_in(
        &mut self,
        target: ZoomTarget,
        now_ms: f64,
        scheduler: &mut Scheduler,
        overrides: &mut FillOverrides,
    ) -> Option<AnimationHandle> {
        self.cancel(scheduler, overrides);
        self.focus = Some(target);
        let scale = self.viewport.focus_scale;

        if self.animation.reduced_motion {
            self.set_transform_instant(target.centroid, scale);
            return None;
        }
        let Some(anim) = ZoomAnimation::zoom_in(
            target.region,
            self.transform,
            target.centroid,
            &target.bounds,
            scale,
            &self.bounds,
            AnimationTimings::zoom_in(&self.animation),
            now_ms,
        ) else {
            tracing::debug!("degenerate zoom path to region {}; jumping", target.region);
            self.set_transform_instant(target.centroid, scale);
            return None;
        };
        Some(self.start(anim, scheduler))
    }

    /// Animates back to the identity transform and clears the focus.
    pub fn animate_reset_to_global(
        &mut self,
        now_ms: f64,
        scheduler: &mut Scheduler,
        overrides: &mut FillOverrides,
    ) -> Option<AnimationHandle> {
        self.cancel(scheduler, overrides);
        let last = self.focus.map(|f| f.bounds);

        let anim = if self.animation.reduced_motion {
            None
        } else {
            ZoomAnimation::reset(
                self.transform,
                last.as_ref(),
                &self.bounds,
                AnimationTimings::reset(&self.animation),
                now_ms,
            )
        };
        match anim {
            Some(anim) => Some(self.start(anim, scheduler)),
            None => {
                self.transform = ViewportTransform::IDENTITY;
                self.focus = None;
                None
            }
        }
    }

    /// Handles a fired frame task. Stale ids are ignored. Returns `true` when
    /// the transform or overlay changed.
    pub fn on_frame(
        &mut self,
        task: TaskId,
        now_ms: f64,
        scheduler: &mut Scheduler,
        overrides: &mut FillOverrides,
    ) -> bool {
        if self.frame_task != Some(task) {
            return false;
        }
        self.frame_task = None;
        let Some((_, anim)) = self.active.as_mut() else {
            return false;
        };

        let frame = anim.update(now_ms);
        let kind = anim.kind;
        self.transform = self.bounds.clamp(frame.transform);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.progress = frame.stroke_progress;
        }

        if let AnimationKind::ZoomIn { region } = kind {
            if frame.flash_on && !self.flashing {
                let base = self.focus.map(|f| f.base_fill).unwrap_or(FLASH_COLOR);
                overrides.set(region, base, FLASH_COLOR);
                self.flashing = true;
            } else if !frame.flash_on && self.flashing {
                overrides.restore(region);
                self.flashing = false;
            }
        }

        if frame.phase == AnimationPhase::Completing {
            self.complete(kind, overrides);
        } else {
            self.frame_task = Some(scheduler.request_frame(FRAME_TASK_LABEL));
        }
        true
    }

    fn complete(&mut self, kind: AnimationKind, overrides: &mut FillOverrides) {
        if let Some((_, mut anim)) = self.active.take() {
            self.apply(anim.final_transform());
            anim.finish();
        }
        if self.flashing {
            overrides.restore_all();
            self.flashing = false;
        }
        if kind == AnimationKind::ResetToGlobal {
            self.transform = ViewportTransform::IDENTITY;
            self.focus = None;
            self.overlay = None;
            overrides.restore_all();
        }
    }

    /// Stops the running animation: cancels its frame task, removes the
    /// overlay and restores overridden fills. The transform stays where the
    /// last frame left it.
    pub fn cancel(&mut self, scheduler: &mut Scheduler, overrides: &mut FillOverrides) {
        if let Some(id) = self.frame_task.take() {
            scheduler.cancel(id);
        }
        self.active = None;
        self.overlay = None;
        self.flashing = false;
        overrides.restore_all();
    }

    /// Freehand drag. Ignored below the drag threshold; cancels any scripted
    /// animation otherwise.
    pub fn pan_by(
        &mut self,
        dx: f64,
        dy: f64,
        scheduler: &mut Scheduler,
        overrides: &mut FillOverrides,
    ) -> bool {
        if !self.drag_enabled() || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        self.cancel(scheduler, overrides);
        let t = self.transform;
        self.apply(ViewportTransform::new(t.x + dx, t.y + dy, t.k));
        true
    }

    /// Discrete zoom about a screen point (wheel, double-click, pinch).
    pub fn zoom_at(
        &mut self,
        anchor: Vec2,
        factor: f64,
        scheduler: &mut Scheduler,
        overrides: &mut FillOverrides,
    ) {
        self.cancel(scheduler, overrides);
        self.transform = self.bounds.zoom_at(self.transform, anchor, factor);
    }
}
