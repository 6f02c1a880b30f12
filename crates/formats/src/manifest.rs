use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

pub const MANIFEST_VERSION: &str = "1.0";

/// Four-digit calendar years, the same window wide tables accept as headers.
pub const YEAR_WINDOW: std::ops::RangeInclusive<i32> = 1000..=9999;

/// Which family of region identifiers the map joins on.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    /// Countries keyed by ISO-3166 alpha-3.
    #[default]
    World,
    /// Japanese prefectures keyed by cleaned name.
    Japan,
}

/// Whether quantile breaks are computed over the whole dataset or per year.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinningScope {
    #[default]
    Global,
    PerYear,
}

/// Page-level configuration: data sources plus tuning for every controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapManifest {
    pub version: String,
    pub name: Option<String>,
    pub map_kind: MapKind,
    pub projection: String,
    pub sources: DataSources,
    pub years: YearsConfig,
    pub decay: DecayConfig,
    pub colors: ColorConfig,
    pub viewport: ViewportConfig,
    pub animation: AnimationConfig,
    pub timeline: TimelineConfig,
    pub storage_key: String,
    pub dom: DomIds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DataSources {
    /// Required: GeoJSON feature collection of regions.
    pub geometry: String,
    pub series: Option<String>,
    pub events: Option<String>,
    pub formula: Option<String>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct YearsConfig {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecayConfig {
    /// Per-year decay rate α used when a region has no override.
    pub default_rate: f64,
    /// Keyed by canonical region id.
    pub per_region: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    pub bins: usize,
    pub palette: String,
    pub scope: BinningScope,
    pub no_data: String,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub max_scale: f64,
    /// Overscroll margin in pixels allowed past each map edge.
    pub padding: f64,
    /// Freehand drag is only enabled at or above this scale.
    pub drag_min_scale: f64,
    /// Zoom factor applied per wheel notch or double-click.
    pub zoom_step: f64,
    /// Target scale for click-to-zoom.
    pub focus_scale: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    pub zoom_ms: f64,
    pub reset_ms: f64,
    pub stroke_ms: f64,
    pub flash_delay_ms: f64,
    pub flash_ms: f64,
    pub reduced_motion: bool,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineConfig {
    /// Total wall time for one autoplay pass over the year range.
    pub autoplay_budget_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DomIds {
    pub canvas: String,
    pub tooltip: String,
    pub slider: String,
    pub year_label: String,
    pub play_button: String,
    pub legend: String,
    pub filters: String,
    pub error: String,
    pub formula: String,
}

impl Default for MapManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: None,
            map_kind: MapKind::World,
            projection: "mercator".to_string(),
            sources: DataSources::default(),
            years: YearsConfig::default(),
            decay: DecayConfig::default(),
            colors: ColorConfig::default(),
            viewport: ViewportConfig::default(),
            animation: AnimationConfig::default(),
            timeline: TimelineConfig::default(),
            storage_key: "hazard-atlas.categories.v1".to_string(),
            dom: DomIds::default(),
        }
    }
}

impl Default for YearsConfig {
    fn default() -> Self {
        Self {
            min: 1960,
            max: 2020,
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            default_rate: 0.05,
            per_region: BTreeMap::new(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            bins: 9,
            palette: "YlOrRd".to_string(),
            scope: BinningScope::Global,
            no_data: "#d9d9d9".to_string(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            max_scale: 8.0,
            padding: 80.0,
            drag_min_scale: 1.5,
            zoom_step: 1.5,
            focus_scale: 4.0,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            zoom_ms: 1200.0,
            reset_ms: 900.0,
            stroke_ms: 800.0,
            flash_delay_ms: 700.0,
            flash_ms: 600.0,
            reduced_motion: false,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            autoplay_budget_ms: 20_000.0,
        }
    }
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            canvas: "map-canvas".to_string(),
            tooltip: "map-tooltip".to_string(),
            slider: "year-slider".to_string(),
            year_label: "year-label".to_string(),
            play_button: "play-button".to_string(),
            legend: "map-legend".to_string(),
            filters: "category-filters".to_string(),
            error: "map-error".to_string(),
            formula: "formula-panel".to_string(),
        }
    }
}

impl MapManifest {
    pub fn from_json_str(payload: &str) -> Result<Self, FormatError> {
        let manifest: Self =
            serde_json::from_str(payload).map_err(|e| FormatError::Json(e.to_string()))?;
        Ok(manifest.sanitized())
    }

    /// Clamps tuning values into workable ranges.
    pub fn sanitized(mut self) -> Self {
        if self.years.min > self.years.max {
            std::mem::swap(&mut self.years.min, &mut self.years.max);
        }
        let (lo, hi) = (*YEAR_WINDOW.start(), *YEAR_WINDOW.end());
        self.years.min = self.years.min.clamp(lo, hi);
        self.years.max = self.years.max.clamp(lo, hi);
        self.decay.default_rate = sanitize_rate(self.decay.default_rate);
        for rate in self.decay.per_region.values_mut() {
            *rate = sanitize_rate(*rate);
        }
        self.colors.bins = self.colors.bins.clamp(2, 12);
        self.viewport.max_scale = self.viewport.max_scale.max(1.0);
        self.viewport.padding = self.viewport.padding.max(0.0);
        if self.viewport.zoom_step.is_nan() || self.viewport.zoom_step <= 1.0 {
            self.viewport.zoom_step = ViewportConfig::default().zoom_step;
        }
        self.viewport.focus_scale = self.viewport.focus_scale.clamp(1.0, self.viewport.max_scale);
        self.timeline.autoplay_budget_ms = self.timeline.autoplay_budget_ms.max(0.0);
        self
    }
}

fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        DecayConfig::default().default_rate
    }
}

#[cfg(test)]
mod tests {
    use super::{BinningScope, MapKind, MapManifest};

    #[test]
    fn empty_manifest_uses_defaults() {
        let m = MapManifest::from_json_str("{}").unwrap();
        assert_eq!(m, MapManifest::default());
        assert_eq!(m.colors.bins, 9);
        assert_eq!(m.dom.canvas, "map-canvas");
    }

    #[test]
    fn parses_partial_sections() {
        let m = MapManifest::from_json_str(
            r#"{"map_kind":"japan",
                "sources":{"geometry":"japan.geojson","series":"risk.csv"},
                "years":{"min":2020,"max":1965},
                "decay":{"per_region":{"tokyo":0.1}},
                "colors":{"scope":"per-year","bins":40}}"#,
        )
        .unwrap();
        assert_eq!(m.map_kind, MapKind::Japan);
        assert_eq!(m.sources.series.as_deref(), Some("risk.csv"));
        assert_eq!(m.sources.events, None);
        assert_eq!((m.years.min, m.years.max), (1965, 2020));
        assert_eq!(m.decay.per_region.get("tokyo"), Some(&0.1));
        assert_eq!(m.decay.default_rate, 0.05);
        assert_eq!(m.colors.scope, BinningScope::PerYear);
        assert_eq!(m.colors.bins, 12);
    }

    #[test]
    fn years_are_clamped_to_four_digits() {
        let m = MapManifest::from_json_str(r#"{"years":{"min":-2147483648,"max":2147483647}}"#)
            .unwrap();
        assert_eq!((m.years.min, m.years.max), (1000, 9999));

        let m = MapManifest::from_json_str(r#"{"years":{"min":12000,"max":11000}}"#).unwrap();
        assert_eq!((m.years.min, m.years.max), (9999, 9999));
    }
}
