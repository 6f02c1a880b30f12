use std::collections::HashMap;

use formats::{FeatureCollection, Geometry};
use foundation::bounds::Aabb2;
use foundation::ids::RegionId;
use runtime::{EventBus, Frame};

use crate::naming::NameResolver;

pub const UNMATCHED_REGION: &str = "unmatched-region";

/// One drawable region with its resolution result stamped at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub index: usize,
    /// Canonical id; `None` excludes the region from data joins.
    pub id: Option<RegionId>,
    pub name: String,
    pub matched: bool,
    pub geometry: Geometry,
    pub lon_lat_bounds: Aabb2,
}

/// The loaded map: static after construction.
#[derive(Debug, Default)]
pub struct RegionWorld {
    regions: Vec<Region>,
    by_id: HashMap<RegionId, usize>,
}

impl RegionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every polygonal feature once. Point or null geometries are
    /// skipped; resolution misses are logged and recorded on `bus` against
    /// `frame`.
    pub fn from_features(
        collection: &FeatureCollection,
        resolver: &NameResolver,
        frame: Frame,
        bus: &mut EventBus,
    ) -> Self {
        let mut world = Self::new();
        for feature in &collection.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            if !matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
                continue;
            }

            let res = resolver.resolve(feature.id.as_deref(), &feature.properties);
            if res.id.is_none() || !res.matched {
                tracing::debug!(
                    "region {:?} ({:?}) did not resolve to a known id",
                    res.display_name,
                    res.id
                );
                let label = res
                    .id
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| res.display_name.clone());
                bus.emit(frame, UNMATCHED_REGION, label);
            }

            let index = world.regions.len();
            if let Some(id) = &res.id {
                if world.by_id.contains_key(id) {
                    tracing::debug!("duplicate region id {id}; keeping the first feature");
                } else {
                    world.by_id.insert(id.clone(), index);
                }
            }
            world.regions.push(Region {
                index,
                id: res.id,
                name: res.display_name,
                matched: res.matched,
                lon_lat_bounds: geometry.lon_lat_bounds(),
                geometry: geometry.clone(),
            });
        }
        world
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn index_of(&self, id: &RegionId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.regions.iter().filter_map(|r| r.id.as_ref())
    }

    pub fn lon_lat_bounds(&self) -> Aabb2 {
        self.regions
            .iter()
            .fold(Aabb2::empty(), |acc, r| acc.union(&r.lon_lat_bounds))
    }
}
