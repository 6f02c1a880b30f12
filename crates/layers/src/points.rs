use std::collections::{BTreeMap, BTreeSet};

use formats::DisasterEvent;
use foundation::color::Rgb;
use foundation::math::{GeoProjection, Vec2};

use crate::layer::{Layer, LayerId};
use crate::symbology::category_colors;

/// Set of categories currently switched off. Everything else is active, so
/// categories first seen after the filter was built default to visible.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    disabled: BTreeSet<String>,
}

impl CategoryFilter {
    pub fn all_enabled() -> Self {
        Self::default()
    }

    pub fn from_toggles<'a>(toggles: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self {
            disabled: toggles
                .into_iter()
                .filter(|(_, on)| !on)
                .map(|(c, _)| c.to_string())
                .collect(),
        }
    }

    pub fn is_active(&self, category: &str) -> bool {
        !self.disabled.contains(category)
    }

    pub fn set_active(&mut self, category: &str, active: bool) {
        if active {
            self.disabled.remove(category);
        } else {
            self.disabled.insert(category.to_string());
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointMark {
    pub index: usize,
    pub position: Vec2,
    pub color: Rgb,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointSnapshot {
    pub marks: Vec<PointMark>,
}

impl PointSnapshot {
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.marks.iter().map(|m| m.index)
    }
}

/// Disaster events drawn as dots over the choropleth.
#[derive(Debug, Clone)]
pub struct PointLayer {
    id: LayerId,
    events: Vec<DisasterEvent>,
    /// Map-space positions, parallel to `events`; `None` when unprojectable.
    positions: Vec<Option<Vec2>>,
    colors: BTreeMap<String, Rgb>,
    pub radius: f64,
}

impl PointLayer {
    pub fn new(id: u64, events: Vec<DisasterEvent>) -> Self {
        let colors = category_colors(events.iter().map(|e| e.category.as_str()));
        Self {
            id: LayerId(id),
            positions: vec![None; events.len()],
            events,
            colors,
            radius: 3.0,
        }
    }

    /// Recomputes map positions; call after the projection changes.
    pub fn project(&mut self, projection: &GeoProjection) {
        self.positions = self
            .events
            .iter()
            .map(|e| projection.project(e.lon_deg, e.lat_deg))
            .collect();
    }

    pub fn events(&self) -> &[DisasterEvent] {
        &self.events
    }

    pub fn event(&self, index: usize) -> Option<&DisasterEvent> {
        self.events.get(index)
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.positions.get(index).copied().flatten()
    }

    /// Sorted distinct categories.
    pub fn categories(&self) -> Vec<&str> {
        self.colors.keys().map(String::as_str).collect()
    }

    pub fn color_for(&self, category: &str) -> Option<Rgb> {
        self.colors.get(category).copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dated `year` (undated events always show) in an active
    /// category with a valid projected position.
    pub fn extract(&self, year: i32, filter: &CategoryFilter) -> PointSnapshot {
        let marks = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.year.is_none_or(|y| y == year))
            .filter(|(_, e)| filter.is_active(&e.category))
            .filter_map(|(index, e)| {
                Some(PointMark {
                    index,
                    position: self.position(index)?,
                    color: self.color_for(&e.category)?,
                })
            })
            .collect();
        PointSnapshot { marks }
    }
}

impl Layer for PointLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn z_index(&self) -> i32 {
        10
    }
}
