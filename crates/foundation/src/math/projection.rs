//! Geographic projection adapter.
//!
//! Maps `(lon, lat)` in degrees to planar map coordinates (pixels at the
//! identity viewport transform, +y down) and back.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::Vec2;
use crate::bounds::Aabb2;

/// Latitude limit of Web Mercator.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ProjectionKind {
    #[default]
    Mercator,
    Equirectangular,
}

impl ProjectionKind {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "equirectangular" | "plate-carree" | "platecarree" => ProjectionKind::Equirectangular,
            _ => ProjectionKind::Mercator,
        }
    }

    fn raw(self, lon_deg: f64, lat_deg: f64) -> Option<Vec2> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() {
            return None;
        }
        let lambda = lon_deg.to_radians();
        match self {
            ProjectionKind::Mercator => {
                let lat = lat_deg.clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG);
                let phi = lat.to_radians();
                Some(Vec2::new(lambda, -(FRAC_PI_4 + phi * 0.5).tan().ln()))
            }
            ProjectionKind::Equirectangular => Some(Vec2::new(lambda, -lat_deg.to_radians())),
        }
    }

    fn raw_invert(self, p: Vec2) -> Option<(f64, f64)> {
        if !p.is_finite() {
            return None;
        }
        let lon = p.x.to_degrees();
        let lat = match self {
            ProjectionKind::Mercator => (2.0 * (-p.y).exp().atan() - FRAC_PI_2).to_degrees(),
            ProjectionKind::Equirectangular => (-p.y).to_degrees(),
        };
        Some((lon, lat))
    }
}

/// A projection with a uniform scale and translate applied after the raw
/// projection, mirroring the usual `projection.scale(..).translate(..)` setup.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoProjection {
    pub kind: ProjectionKind,
    pub scale: f64,
    pub translate: Vec2,
}

impl GeoProjection {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<Vec2> {
        let raw = self.kind.raw(lon_deg, lat_deg)?;
        Some(raw * self.scale + self.translate)
    }

    pub fn invert(&self, p: Vec2) -> Option<(f64, f64)> {
        if self.scale == 0.0 {
            return None;
        }
        self.kind.raw_invert((p - self.translate) * (1.0 / self.scale))
    }

    /// Fits `lon_lat_bounds` into a `width` x `height` canvas, leaving `margin`
    /// pixels on every side, and centers it.
    pub fn fit_extent(
        kind: ProjectionKind,
        lon_lat_bounds: &Aabb2,
        width: f64,
        height: f64,
        margin: f64,
    ) -> Self {
        let mut fitted = Self::new(kind);
        if lon_lat_bounds.is_empty() {
            fitted.translate = Vec2::new(width * 0.5, height * 0.5);
            return fitted;
        }

        let mut raw_bounds = Aabb2::empty();
        for (lon, lat) in [
            (lon_lat_bounds.min[0], lon_lat_bounds.min[1]),
            (lon_lat_bounds.max[0], lon_lat_bounds.max[1]),
        ] {
            if let Some(p) = kind.raw(lon, lat) {
                raw_bounds.extend(p.x, p.y);
            }
        }

        let avail_w = (width - 2.0 * margin).max(1.0);
        let avail_h = (height - 2.0 * margin).max(1.0);
        let sx = if raw_bounds.width() > 0.0 {
            avail_w / raw_bounds.width()
        } else {
            f64::INFINITY
        };
        let sy = if raw_bounds.height() > 0.0 {
            avail_h / raw_bounds.height()
        } else {
            f64::INFINITY
        };
        let scale = sx.min(sy);
        fitted.scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };

        let c = raw_bounds.center();
        fitted.translate = Vec2::new(width * 0.5, height * 0.5) - c * fitted.scale;
        fitted
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoProjection, ProjectionKind};
    use crate::bounds::Aabb2;
    use crate::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn mercator_round_trip() {
        let p = GeoProjection {
            kind: ProjectionKind::Mercator,
            scale: 150.0,
            translate: Vec2::new(480.0, 250.0),
        };
        let xy = p.project(139.69, 35.69).unwrap();
        let (lon, lat) = p.invert(xy).unwrap();
        assert_close(lon, 139.69, 1e-9);
        assert_close(lat, 35.69, 1e-9);
    }

    #[test]
    fn north_is_up_on_screen() {
        let p = GeoProjection::new(ProjectionKind::Equirectangular);
        let north = p.project(0.0, 10.0).unwrap();
        let south = p.project(0.0, -10.0).unwrap();
        assert!(north.y < south.y);
    }

    #[test]
    fn rejects_non_finite_input() {
        let p = GeoProjection::new(ProjectionKind::Mercator);
        assert!(p.project(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn fit_extent_centers_bounds() {
        let bounds = Aabb2::new([-180.0, -60.0], [180.0, 80.0]);
        let p = GeoProjection::fit_extent(ProjectionKind::Mercator, &bounds, 960.0, 500.0, 10.0);
        let a = p.project(-180.0, -60.0).unwrap();
        let b = p.project(180.0, 80.0).unwrap();
        assert_close(0.5 * (a.x + b.x), 480.0, 1e-6);
        assert_close(0.5 * (a.y + b.y), 250.0, 1e-6);
        assert!(a.x >= 9.999 && b.x <= 950.001);
        assert!(b.y >= 9.999 && a.y <= 490.001);
    }
}
