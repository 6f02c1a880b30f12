use foundation::bounds::Aabb2;
use foundation::math::{GeoProjection, Vec2};

use crate::world::RegionWorld;

/// A region's rings in map coordinates (pixels at the identity transform).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRegion {
    pub index: usize,
    /// Polygons, each a list of rings with the outer ring first.
    pub polygons: Vec<Vec<Vec<Vec2>>>,
    pub bounds: Aabb2,
    /// Area-weighted centroid; falls back to the bounds center for
    /// degenerate (zero-area) shapes. `None` if nothing projected.
    pub centroid: Option<Vec2>,
}

/// Projected geometry cache, rebuilt only when the canvas size changes.
#[derive(Debug, Clone)]
pub struct ProjectedMap {
    pub projection: GeoProjection,
    pub width: f64,
    pub height: f64,
    pub regions: Vec<ProjectedRegion>,
}

impl ProjectedMap {
    pub fn build(world: &RegionWorld, projection: GeoProjection, width: f64, height: f64) -> Self {
        let regions = world
            .regions()
            .iter()
            .map(|region| {
                let polygons: Vec<Vec<Vec<Vec2>>> = region
                    .geometry
                    .polygons()
                    .into_iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| {
                                ring.iter()
                                    .filter_map(|p| projection.project(p.lon_deg, p.lat_deg))
                                    .collect::<Vec<_>>()
                            })
                            .filter(|ring| ring.len() >= 3)
                            .collect::<Vec<_>>()
                    })
                    .filter(|rings| !rings.is_empty())
                    .collect();

                let mut bounds = Aabb2::empty();
                for poly in &polygons {
                    if let Some(outer) = poly.first() {
                        for p in outer {
                            bounds.extend(p.x, p.y);
                        }
                    }
                }
                let centroid = polygons_centroid(&polygons)
                    .or_else(|| (!bounds.is_empty()).then(|| bounds.center()));

                ProjectedRegion {
                    index: region.index,
                    polygons,
                    bounds,
                    centroid,
                }
            })
            .collect();

        Self {
            projection,
            width,
            height,
            regions,
        }
    }

    pub fn get(&self, index: usize) -> Option<&ProjectedRegion> {
        self.regions.get(index)
    }
}

/// Signed shoelace area and first moments of a ring.
fn ring_moments(ring: &[Vec2]) -> (f64, f64, f64) {
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    (area2 * 0.5, cx / 6.0, cy / 6.0)
}

fn polygons_centroid(polygons: &[Vec<Vec<Vec2>>]) -> Option<Vec2> {
    let mut total_area = 0.0;
    let mut mx = 0.0;
    let mut my = 0.0;
    for poly in polygons {
        for (i, ring) in poly.iter().enumerate() {
            let (area, rx, ry) = ring_moments(ring);
            // Normalize orientation: outer rings add, holes subtract.
            let sign = if (area >= 0.0) == (i == 0) { 1.0 } else { -1.0 };
            total_area += sign * area;
            mx += sign * rx;
            my += sign * ry;
        }
    }
    if total_area.abs() < 1e-12 {
        return None;
    }
    let c = Vec2::new(mx / total_area, my / total_area);
    c.is_finite().then_some(c)
}

#[cfg(test)]
mod tests {
    use super::ProjectedMap;
    use crate::naming::NameResolver;
    use crate::world::RegionWorld;
    use crate::world::tests::TWO_SQUARES;
    use formats::{FeatureCollection, MapKind};
    use foundation::math::{GeoProjection, ProjectionKind, Vec2};
    use runtime::{EventBus, Frame};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn centroid_of_square_is_its_center() {
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
        let map = ProjectedMap::build(&world, proj, 300.0, 100.0);
        let first = map.get(0).unwrap();
        let expected = proj.project(5.0, 5.0).unwrap();
        let c = first.centroid.unwrap();
        assert_close(c.x, expected.x, 1e-6);
        assert_close(c.y, expected.y, 1e-6);
        assert_eq!(first.polygons.len(), 1);
        assert_eq!(first.polygons[0][0].len(), 5);
    }

    #[test]
    fn holes_shift_the_centroid() {
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let hole = vec![
            Vec2::new(2.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(2.0, 2.0),
        ];
        let c = super::polygons_centroid(&[vec![outer, hole]]).unwrap();
        assert_close(c.x, 1.0, 1e-9);
        assert_close(c.y, 1.0, 1e-9);
    }
}
