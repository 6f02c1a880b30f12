//! Scripted zoom animations as an explicit state machine over injected time.

use formats::AnimationConfig;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;

use crate::arc::CubicBezier;
use crate::easing::{ease_cubic_in_out, progress};
use crate::transform::{ViewportBounds, ViewportTransform};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    Animating,
    /// Every track has run out; the owner applies the end state and drops
    /// the animation.
    Completing,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationKind {
    ZoomIn { region: usize },
    ResetToGlobal,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationTimings {
    pub duration_ms: f64,
    pub stroke_ms: f64,
    pub flash_delay_ms: f64,
    pub flash_ms: f64,
}

impl AnimationTimings {
    pub fn zoom_in(config: &AnimationConfig) -> Self {
        Self {
            duration_ms: config.zoom_ms,
            stroke_ms: config.stroke_ms,
            flash_delay_ms: config.flash_delay_ms,
            flash_ms: config.flash_ms,
        }
    }

    /// Resets draw the arc back but never flash.
    pub fn reset(config: &AnimationConfig) -> Self {
        Self {
            duration_ms: config.reset_ms,
            stroke_ms: config.stroke_ms.min(config.reset_ms),
            flash_delay_ms: 0.0,
            flash_ms: 0.0,
        }
    }
}

/// Sampled state for one frame. `transform` is unclamped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationFrame {
    pub transform: ViewportTransform,
    pub stroke_progress: f64,
    pub flash_on: bool,
    pub phase: AnimationPhase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomAnimation {
    pub kind: AnimationKind,
    /// Map-space path of the point held at the viewport center.
    pub path: CubicBezier,
    /// Resets walk the path from `p3` back to `p0`.
    pub reverse: bool,
    k_from: f64,
    k_to: f64,
    center: Vec2,
    timings: AnimationTimings,
    started_ms: f64,
    phase: AnimationPhase,
}

impl ZoomAnimation {
    /// Arc from the viewport center to `target_centroid` (map coordinates),
    /// laid out in screen space under `from` and carried into map space.
    ///
    /// `None` for degenerate input: non-finite centroid or a zero-length path.
    pub fn zoom_in(
        region: usize,
        from: ViewportTransform,
        target_centroid: Vec2,
        target_bounds: &Aabb2,
        k_to: f64,
        bounds: &ViewportBounds,
        timings: AnimationTimings,
        now_ms: f64,
    ) -> Option<Self> {
        if !target_centroid.is_finite() || !now_ms.is_finite() {
            return None;
        }
        let center = bounds.center();
        let screen_target = from.apply(target_centroid);
        let mut screen_box = Aabb2::empty();
        if !target_bounds.is_empty() {
            for corner in [
                Vec2::new(target_bounds.min[0], target_bounds.min[1]),
                Vec2::new(target_bounds.max[0], target_bounds.max[1]),
            ] {
                let p = from.apply(corner);
                screen_box.extend(p.x, p.y);
            }
        }

        let screen_path = CubicBezier::arc(center, screen_target, &screen_box);
        if !(screen_path.chord_length() > 1e-6) {
            return None;
        }
        let path = screen_path.map(|p| from.invert(p));
        if !path.is_finite() {
            return None;
        }
        Some(Self {
            kind: AnimationKind::ZoomIn { region },
            path,
            reverse: false,
            k_from: from.k,
            k_to: bounds.clamp_scale(k_to),
            center,
            timings,
            started_ms: now_ms,
            phase: AnimationPhase::Animating,
        })
    }

    /// Back to the identity transform along the arc a zoom from identity to
    /// the current view would have taken, walked in reverse.
    ///
    /// `None` when already at identity (nothing to animate).
    pub fn reset(
        from: ViewportTransform,
        last_target_bounds: Option<&Aabb2>,
        bounds: &ViewportBounds,
        timings: AnimationTimings,
        now_ms: f64,
    ) -> Option<Self> {
        if !now_ms.is_finite() {
            return None;
        }
        let center = bounds.center();
        // At identity, map and screen coordinates coincide.
        let home = center;
        let here = from.invert(center);
        if !here.is_finite() {
            return None;
        }
        let avoid = last_target_bounds.copied().unwrap_or_else(Aabb2::empty);
        let path = CubicBezier::arc(home, here, &avoid);
        if !(path.chord_length() > 1e-6) && (from.k - 1.0).abs() < 1e-9 {
            return None;
        }
        Some(Self {
            kind: AnimationKind::ResetToGlobal,
            path,
            reverse: true,
            k_from: from.k,
            k_to: 1.0,
            center,
            timings,
            started_ms: now_ms,
            phase: AnimationPhase::Animating,
        })
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn started_ms(&self) -> f64 {
        self.started_ms
    }

    fn has_flash(&self) -> bool {
        matches!(self.kind, AnimationKind::ZoomIn { .. }) && self.timings.flash_ms > 0.0
    }

    /// Time until every track (transform, stroke, flash) has finished.
    pub fn total_ms(&self) -> f64 {
        let mut total = self.timings.duration_ms.max(self.timings.stroke_ms);
        if self.has_flash() {
            total = total.max(self.timings.flash_delay_ms + self.timings.flash_ms);
        }
        total.max(0.0)
    }

    fn transform_at(&self, eased: f64) -> ViewportTransform {
        let s = if self.reverse { 1.0 - eased } else { eased };
        let m = self.path.point(s);
        let k = if self.k_from > 0.0 && self.k_to > 0.0 {
            self.k_from * (self.k_to / self.k_from).powf(eased)
        } else {
            self.k_to
        };
        ViewportTransform::centered_on(m, k, self.center)
    }

    /// End state of the transform track.
    pub fn final_transform(&self) -> ViewportTransform {
        match self.kind {
            AnimationKind::ResetToGlobal => ViewportTransform::IDENTITY,
            AnimationKind::ZoomIn { .. } => {
                ViewportTransform::centered_on(self.path.p3, self.k_to, self.center)
            }
        }
    }

    /// Advances to `now_ms`. Time never runs backwards: earlier timestamps
    /// sample the start.
    pub fn update(&mut self, now_ms: f64) -> AnimationFrame {
        let elapsed = if now_ms.is_finite() {
            (now_ms - self.started_ms).max(0.0)
        } else {
            0.0
        };

        if self.phase == AnimationPhase::Animating && elapsed >= self.total_ms() {
            self.phase = AnimationPhase::Completing;
        }
        if self.phase != AnimationPhase::Animating {
            return AnimationFrame {
                transform: self.final_transform(),
                stroke_progress: 1.0,
                flash_on: false,
                phase: self.phase,
            };
        }

        let t = progress(elapsed, self.timings.duration_ms);
        let transform = if t >= 1.0 {
            self.final_transform()
        } else {
            self.transform_at(ease_cubic_in_out(t))
        };
        let flash_start = self.timings.flash_delay_ms;
        let flash_on = self.has_flash()
            && elapsed >= flash_start
            && elapsed < flash_start + self.timings.flash_ms;

        AnimationFrame {
            transform,
            stroke_progress: progress(elapsed, self.timings.stroke_ms),
            flash_on,
            phase: self.phase,
        }
    }

    /// Moves `Completing` to `Idle`.
    pub fn finish(&mut self) {
        self.phase = AnimationPhase::Idle;
    }
}
