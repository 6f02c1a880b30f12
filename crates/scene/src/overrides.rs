use std::collections::BTreeMap;

use foundation::color::Rgb;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FillOverride {
    /// The data-driven fill in effect when the override was first applied.
    pub original: Rgb,
    pub color: Rgb,
}

/// Temporary per-region fill colors (focus highlight, flash) layered over
/// the choropleth. Restoring always returns the color saved by the first
/// `set`, even after repeated overrides.
#[derive(Debug, Default, Clone)]
pub struct FillOverrides {
    entries: BTreeMap<usize, FillOverride>,
}

impl FillOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, region: usize, current: Rgb, color: Rgb) {
        self.entries
            .entry(region)
            .and_modify(|e| e.color = color)
            .or_insert(FillOverride {
                original: current,
                color,
            });
    }

    pub fn override_color(&self, region: usize) -> Option<Rgb> {
        self.entries.get(&region).map(|e| e.color)
    }

    pub fn get(&self, region: usize) -> Option<&FillOverride> {
        self.entries.get(&region)
    }

    /// Drops the override and hands back the saved original.
    pub fn restore(&mut self, region: usize) -> Option<Rgb> {
        self.entries.remove(&region).map(|e| e.original)
    }

    pub fn restore_all(&mut self) -> Vec<(usize, Rgb)> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(i, e)| (i, e.original))
            .collect()
    }

    /// Resolves the fill to draw: the override if present, else `base`.
    pub fn fill_for(&self, region: usize, base: Rgb) -> Rgb {
        self.override_color(region).unwrap_or(base)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
