use foundation::bounds::Aabb2;
use foundation::math::Vec2;

/// Control-point offset as a fraction of the chord length.
const BULGE: f64 = 0.25;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// A gentle arc from `from` to `to` that bows into the vertical
    /// half-plane away from `avoid` (usually the target's bounding box), so
    /// the drawn path is not hidden under the shape it leads to.
    pub fn arc(from: Vec2, to: Vec2, avoid: &Aabb2) -> Self {
        let d = to - from;
        let len = d.length();
        if !(len > 0.0) || !len.is_finite() {
            return Self::new(from, from, to, to);
        }
        let mid = from.lerp(to, 0.5);
        let away = if avoid.is_empty() { to } else { avoid.center() };

        let mut n = d.perp() * (1.0 / len);
        let flip = if n.y != 0.0 {
            // +y is down: bow up when the box sits at or below the midpoint.
            let want_down = away.y < mid.y;
            (n.y > 0.0) != want_down
        } else {
            let want_right = away.x < mid.x;
            (n.x > 0.0) != want_right
        };
        if flip {
            n = n * -1.0;
        }

        let offset = n * (len * BULGE);
        Self::new(
            from,
            from + d * (1.0 / 3.0) + offset,
            from + d * (2.0 / 3.0) + offset,
            to,
        )
    }

    pub fn point(&self, t: f64) -> Vec2 {
        if t <= 0.0 {
            return self.p0;
        }
        if t >= 1.0 {
            return self.p3;
        }
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    /// Applies an affine map to the control points; the curve maps with them.
    pub fn map(&self, f: impl Fn(Vec2) -> Vec2) -> Self {
        Self::new(f(self.p0), f(self.p1), f(self.p2), f(self.p3))
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    pub fn chord_length(&self) -> f64 {
        self.p0.distance(self.p3)
    }

    /// Polyline over `[t0, t1]` with `segments` pieces.
    pub fn sample(&self, t0: f64, t1: f64, segments: usize) -> Vec<Vec2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point(t0 + (t1 - t0) * i as f64 / segments as f64))
            .collect()
    }

    pub fn length(&self, segments: usize) -> f64 {
        self.sample(0.0, 1.0, segments)
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    pub fn is_finite(&self) -> bool {
        self.p0.is_finite() && self.p1.is_finite() && self.p2.is_finite() && self.p3.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::CubicBezier;
    use foundation::bounds::Aabb2;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoints_are_exact() {
        let a = Vec2::new(400.0, 300.0);
        let b = Vec2::new(650.0, 120.0);
        let arc = CubicBezier::arc(a, b, &Aabb2::new([600.0, 80.0], [700.0, 160.0]));
        assert_eq!(arc.point(0.0), a);
        assert_eq!(arc.point(1.0), b);
        assert!(arc.length(64) > arc.chord_length());
    }

    #[test]
    fn bows_away_from_target_box() {
        let a = Vec2::new(400.0, 300.0);
        let b = Vec2::new(600.0, 100.0);
        let mid_chord = a.lerp(b, 0.5);

        // Box above the chord midpoint: the arc bows downward (+y).
        let above = CubicBezier::arc(a, b, &Aabb2::new([550.0, 50.0], [650.0, 150.0]));
        assert!(above.point(0.5).y > mid_chord.y);

        // Box below: the arc bows upward.
        let c = Vec2::new(600.0, 500.0);
        let below = CubicBezier::arc(a, c, &Aabb2::new([550.0, 450.0], [650.0, 550.0]));
        assert!(below.point(0.5).y < a.lerp(c, 0.5).y);
    }

    #[test]
    fn zero_length_is_a_point() {
        let p = Vec2::new(1.0, 2.0);
        let arc = CubicBezier::arc(p, p, &Aabb2::empty());
        assert_eq!(arc.chord_length(), 0.0);
        assert_eq!(arc.point(0.5), p);
    }

    #[test]
    fn reversed_swaps_ends() {
        let arc = CubicBezier::arc(Vec2::ZERO, Vec2::new(10.0, 0.0), &Aabb2::empty());
        let r = arc.reversed();
        assert_eq!(r.point(0.0), arc.point(1.0));
        assert!(r.point(0.25).distance(arc.point(0.75)) < 1e-9);
    }
}
