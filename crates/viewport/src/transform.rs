use formats::ViewportConfig;
use foundation::math::Vec2;

/// Screen = map · k + (x, y).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform = ViewportTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    /// The transform that puts map point `m` at screen point `center` at
    /// scale `k`.
    pub fn centered_on(m: Vec2, k: f64, center: Vec2) -> Self {
        Self {
            x: center.x - m.x * k,
            y: center.y - m.y * k,
            k,
        }
    }

    pub fn translate(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn apply(&self, map: Vec2) -> Vec2 {
        Vec2::new(map.x * self.k + self.x, map.y * self.k + self.y)
    }

    pub fn invert(&self, screen: Vec2) -> Vec2 {
        Vec2::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.k - other.k).abs() <= eps
    }

    pub fn is_identity(&self, eps: f64) -> bool {
        self.approx_eq(&Self::IDENTITY, eps)
    }
}

/// Canvas size plus pan/zoom limits.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportBounds {
    pub width: f64,
    pub height: f64,
    /// Overscroll allowed past each map edge, in screen pixels.
    pub padding: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl ViewportBounds {
    pub fn new(width: f64, height: f64, padding: f64, max_scale: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            padding: padding.max(0.0),
            min_scale: 1.0,
            max_scale: max_scale.max(1.0),
        }
    }

    pub fn from_config(width: f64, height: f64, config: &ViewportConfig) -> Self {
        Self::new(width, height, config.padding, config.max_scale)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn clamp_scale(&self, k: f64) -> f64 {
        if k.is_finite() {
            k.clamp(self.min_scale, self.max_scale)
        } else {
            self.min_scale
        }
    }

    /// Keeps the scaled map covering the viewport, give or take `padding`.
    /// Pure and idempotent.
    pub fn clamp(&self, t: ViewportTransform) -> ViewportTransform {
        let k = self.clamp_scale(t.k);
        ViewportTransform {
            x: clamp_axis(t.x, self.width, k, self.padding),
            y: clamp_axis(t.y, self.height, k, self.padding),
            k,
        }
    }

    /// Scales by `factor` about the screen point `anchor`, keeping the map
    /// point under it fixed (before clamping).
    pub fn zoom_at(&self, t: ViewportTransform, anchor: Vec2, factor: f64) -> ViewportTransform {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return self.clamp(t);
        }
        let m = t.invert(anchor);
        let k = self.clamp_scale(t.k * factor);
        self.clamp(ViewportTransform::centered_on(m, k, anchor))
    }
}

fn clamp_axis(v: f64, size: f64, k: f64, pad: f64) -> f64 {
    let lo = (size - size * k).min(0.0) - pad;
    let hi = pad;
    if v.is_finite() { v.clamp(lo, hi) } else { 0.0 }
}
