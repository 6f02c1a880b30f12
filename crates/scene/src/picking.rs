use foundation::math::Vec2;

use crate::projected::ProjectedMap;

/// Even-odd point-in-ring test.
pub fn ring_contains(ring: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Region under `p` (map coordinates, i.e. already inverse-transformed).
///
/// Later regions are drawn on top, so the scan runs back to front and the
/// topmost hit wins. Holes are honored by the even-odd rule across all rings
/// of a polygon.
pub fn pick_region(map: &ProjectedMap, p: Vec2) -> Option<usize> {
    if !p.is_finite() {
        return None;
    }
    map.regions.iter().rev().find_map(|region| {
        if region.bounds.is_empty() || !region.bounds.contains(p) {
            return None;
        }
        let hit = region.polygons.iter().any(|rings| {
            rings
                .iter()
                .filter(|ring| ring_contains(ring, p))
                .count()
                % 2
                == 1
        });
        hit.then_some(region.index)
    })
}

/// Nearest candidate within `radius` of `p`. Ties keep the lower index.
pub fn pick_point(
    points: &[Vec2],
    candidates: impl IntoIterator<Item = usize>,
    p: Vec2,
    radius: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in candidates {
        let Some(q) = points.get(i) else { continue };
        let d = q.distance(p);
        if !(d <= radius) {
            continue;
        }
        match best {
            Some((bi, bd)) if bd < d || (bd == d && bi < i) => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::{pick_point, pick_region, ring_contains};
    use crate::naming::NameResolver;
    use crate::projected::ProjectedMap;
    use crate::world::RegionWorld;
    use crate::world::tests::TWO_SQUARES;
    use formats::{FeatureCollection, MapKind};
    use foundation::math::{GeoProjection, ProjectionKind, Vec2};
    use runtime::{EventBus, Frame};

    fn square_map() -> ProjectedMap {
        let fc = FeatureCollection::from_geojson_str(TWO_SQUARES).unwrap();
        let world = RegionWorld::from_features(
            &fc,
            &NameResolver::new(MapKind::World),
            Frame::new(0, 0.0),
            &mut EventBus::new(),
        );
        let proj = GeoProjection::fit_extent(
            ProjectionKind::Equirectangular,
            &world.lon_lat_bounds(),
            300.0,
            100.0,
            0.0,
        );
        ProjectedMap::build(&world, proj, 300.0, 100.0)
    }

    #[test]
    fn picks_the_square_under_the_cursor() {
        let map = square_map();
        let proj = map.projection;
        assert_eq!(pick_region(&map, proj.project(5.0, 5.0).unwrap()), Some(0));
        assert_eq!(pick_region(&map, proj.project(25.0, 5.0).unwrap()), Some(1));
        assert_eq!(pick_region(&map, proj.project(15.0, 5.0).unwrap()), None);
        assert_eq!(pick_region(&map, Vec2::new(f64::NAN, 0.0)), None);
    }

    #[test]
    fn even_odd_rule() {
        let ring = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!(ring_contains(&ring, Vec2::new(1.0, 1.0)));
        assert!(!ring_contains(&ring, Vec2::new(3.0, 1.0)));
        assert!(!ring_contains(&ring[..2], Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn nearest_point_within_radius() {
        let pts = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(4.0, 0.0),
        ];
        assert_eq!(pick_point(&pts, 0..3, Vec2::new(3.0, 0.0), 5.0), Some(2));
        // Index 2 hidden by the caller's filter.
        assert_eq!(pick_point(&pts, [0, 1], Vec2::new(3.0, 0.0), 5.0), Some(0));
        assert_eq!(pick_point(&pts, 0..3, Vec2::new(50.0, 0.0), 5.0), None);
    }
}
