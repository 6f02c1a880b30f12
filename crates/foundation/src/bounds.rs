use crate::math::Vec2;

/// Axis-aligned bounding box in 2D (lon/lat degrees or screen pixels).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// An inverted box that any `extend` call will replace.
    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.min[0] <= self.max[0] && self.min[1] <= self.max[1])
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        let mut out = *self;
        if !other.is_empty() {
            out.extend(other.min[0], other.min[1]);
            out.extend(other.max[0], other.max[1]);
        }
        out
    }

    pub fn width(&self) -> f64 {
        (self.max[0] - self.min[0]).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max[1] - self.min[1]).max(0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn extend_ignores_non_finite() {
        let mut b = Aabb2::empty();
        assert!(b.is_empty());
        b.extend(1.0, 2.0);
        b.extend(f64::NAN, 9.0);
        b.extend(-1.0, 4.0);
        assert_eq!(b, Aabb2::new([-1.0, 2.0], [1.0, 4.0]));
        assert_eq!(b.center(), Vec2::new(0.0, 3.0));
    }

    #[test]
    fn union_with_empty_is_identity() {
        let b = Aabb2::new([0.0, 0.0], [2.0, 1.0]);
        assert_eq!(b.union(&Aabb2::empty()), b);
        assert!(b.contains(Vec2::new(1.0, 0.5)));
        assert!(!b.contains(Vec2::new(3.0, 0.5)));
    }
}
