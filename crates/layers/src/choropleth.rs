use compute::analysis::Statistics;
use compute::join::{DataJoin, YearSlice};
use formats::{BinningScope, ColorConfig};
use foundation::color::Rgb;
use scene::overrides::FillOverrides;
use scene::world::RegionWorld;

use crate::layer::{Layer, LayerId};
use crate::symbology::{NO_DATA_COLOR, resample, sequential_palette};

/// Threshold scale over quantile breaks.
///
/// With `n` colors there are `n - 1` thresholds; a value maps to the color at
/// the count of thresholds `<=` it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethScale {
    thresholds: Vec<f64>,
    colors: Vec<Rgb>,
    no_data: Rgb,
    domain: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    /// `None` on the open ends when the domain is empty.
    pub lo: Option<f64>,
    pub hi: Option<f64>,
    pub color: Rgb,
}

impl ChoroplethScale {
    pub fn from_values(values: impl IntoIterator<Item = f64>, colors: Vec<Rgb>, no_data: Rgb) -> Self {
        let sorted = Statistics::sorted_finite(values);
        let thresholds = if sorted.is_empty() || colors.len() < 2 {
            Vec::new()
        } else {
            let n = colors.len();
            (1..n)
                .filter_map(|i| Statistics::quantile(&sorted, i as f64 / n as f64))
                .collect()
        };
        let domain = sorted.first().zip(sorted.last()).map(|(a, b)| (*a, *b));
        Self {
            thresholds,
            colors,
            no_data,
            domain,
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn no_data(&self) -> Rgb {
        self.no_data
    }

    /// Missing and non-finite values never enter the scale.
    pub fn color_for(&self, value: Option<f64>) -> Rgb {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return self.no_data;
        };
        if self.domain.is_none() {
            return self.no_data;
        }
        let bin = self.thresholds.partition_point(|t| *t <= v);
        self.colors
            .get(bin.min(self.colors.len().saturating_sub(1)))
            .copied()
            .unwrap_or(self.no_data)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let Some((min, max)) = self.domain else {
            return Vec::new();
        };
        let k = self.thresholds.len();
        self.colors
            .iter()
            .take(k + 1)
            .enumerate()
            .map(|(i, color)| LegendEntry {
                lo: Some(if i == 0 { min } else { self.thresholds[i - 1] }),
                hi: Some(if i == k { max } else { self.thresholds[i] }),
                color: *color,
            })
            .collect()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CacheKey {
    Global,
    Year(i32),
}

/// Builds and caches the scale for the configured binning scope.
///
/// Global scope computes breaks once over every dense value; per-year scope
/// recomputes whenever the selected year changes.
#[derive(Debug, Clone)]
pub struct Colorizer {
    scope: BinningScope,
    colors: Vec<Rgb>,
    no_data: Rgb,
    cached: Option<(CacheKey, ChoroplethScale)>,
}

impl Colorizer {
    pub fn new(config: &ColorConfig) -> Self {
        let palette = sequential_palette(&config.palette);
        let no_data = Rgb::from_hex(&config.no_data).unwrap_or(NO_DATA_COLOR);
        Self {
            scope: config.scope,
            colors: resample(&palette, config.bins),
            no_data,
            cached: None,
        }
    }

    pub fn scope(&self) -> BinningScope {
        self.scope
    }

    pub fn scale_for(&mut self, join: &DataJoin, slice: &YearSlice) -> &ChoroplethScale {
        let key = match self.scope {
            BinningScope::Global => CacheKey::Global,
            BinningScope::PerYear => CacheKey::Year(slice.year),
        };
        if !matches!(&self.cached, Some((k, _)) if *k == key) {
            self.cached = None;
        }
        let (colors, no_data) = (&self.colors, self.no_data);
        let (_, scale) = self.cached.get_or_insert_with(|| {
            let scale = match key {
                CacheKey::Global => {
                    ChoroplethScale::from_values(join.all_values(), colors.clone(), no_data)
                }
                CacheKey::Year(_) => {
                    ChoroplethScale::from_values(slice.values(), colors.clone(), no_data)
                }
            };
            tracing::debug!("choropleth breaks ({key:?}): {:?}", scale.thresholds());
            (key, scale)
        });
        scale
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RegionFill {
    pub index: usize,
    pub value: Option<f64>,
    /// Data-driven fill before overrides.
    pub base: Rgb,
    pub fill: Rgb,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChoroplethSnapshot {
    pub fills: Vec<RegionFill>,
}

impl ChoroplethSnapshot {
    pub fn get(&self, index: usize) -> Option<&RegionFill> {
        self.fills.get(index)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChoroplethLayer {
    id: LayerId,
}

impl ChoroplethLayer {
    pub fn new(id: u64) -> Self {
        Self { id: LayerId(id) }
    }

    /// Regions without a canonical id are excluded from the join and always
    /// get the no-data fill.
    pub fn extract(
        &self,
        world: &RegionWorld,
        slice: &YearSlice,
        scale: &ChoroplethScale,
        overrides: &FillOverrides,
    ) -> ChoroplethSnapshot {
        let fills = world
            .regions()
            .iter()
            .map(|region| {
                let value = region
                    .id
                    .as_ref()
                    .and_then(|id| slice.lookup(Some(id), &region.name));
                let base = scale.color_for(value);
                RegionFill {
                    index: region.index,
                    value,
                    base,
                    fill: overrides.fill_for(region.index, base),
                }
            })
            .collect();
        ChoroplethSnapshot { fills }
    }
}

impl Layer for ChoroplethLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{ChoroplethScale, Colorizer};
    use compute::join::{DataJoin, DecayRates, JoinRow};
    use formats::{BinningScope, ColorConfig};
    use foundation::color::Rgb;
    use foundation::ids::RegionId;
    use foundation::time::YearRange;
    use pretty_assertions::assert_eq;

    const NO_DATA: Rgb = Rgb::new(1, 1, 1);

    fn colors(n: u8) -> Vec<Rgb> {
        (0..n).map(|i| Rgb::new(i * 10, 0, 0)).collect()
    }

    #[test]
    fn quantile_threshold_mapping() {
        let scale = ChoroplethScale::from_values(
            [1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN],
            colors(4),
            NO_DATA,
        );
        assert_eq!(scale.thresholds(), &[2.0, 3.0, 4.0]);
        assert_eq!(scale.color_for(Some(1.0)), Rgb::new(0, 0, 0));
        assert_eq!(scale.color_for(Some(2.0)), Rgb::new(10, 0, 0));
        assert_eq!(scale.color_for(Some(99.0)), Rgb::new(30, 0, 0));
        assert_eq!(scale.color_for(None), NO_DATA);
        assert_eq!(scale.color_for(Some(f64::NAN)), NO_DATA);
    }

    #[test]
    fn empty_domain_is_all_no_data() {
        let scale = ChoroplethScale::from_values([f64::NAN], colors(4), NO_DATA);
        assert_eq!(scale.color_for(Some(3.0)), NO_DATA);
        assert!(scale.legend().is_empty());
    }

    #[test]
    fn legend_spans_domain() {
        let scale = ChoroplethScale::from_values([0.0, 10.0], colors(2), NO_DATA);
        let legend = scale.legend();
        assert_eq!(legend.len(), 2);
        assert_eq!((legend[0].lo, legend[0].hi), (Some(0.0), Some(5.0)));
        assert_eq!((legend[1].lo, legend[1].hi), (Some(5.0), Some(10.0)));
    }

    fn sample_join() -> DataJoin {
        let rows = [("AAA", 2000, 1.0), ("BBB", 2000, 2.0), ("AAA", 2001, 100.0), ("BBB", 2001, 200.0)]
            .into_iter()
            .map(|(r, year, value)| JoinRow {
                region: RegionId::from(r),
                name: None,
                year,
                value,
            });
        DataJoin::build(rows, YearRange::new(2000, 2001), &DecayRates::uniform(0.0))
    }

    #[test]
    fn scope_controls_break_source() {
        let join = sample_join();
        let mut config = ColorConfig {
            bins: 2,
            ..ColorConfig::default()
        };

        let mut global = Colorizer::new(&config);
        let g2000 = global.scale_for(&join, &join.select_year(2000)).clone();
        let g2001 = global.scale_for(&join, &join.select_year(2001)).clone();
        assert_eq!(g2000, g2001);
        assert_eq!(g2000.thresholds(), &[51.0]);

        config.scope = BinningScope::PerYear;
        let mut per_year = Colorizer::new(&config);
        assert_eq!(per_year.scale_for(&join, &join.select_year(2000)).thresholds(), &[1.5]);
        assert_eq!(per_year.scale_for(&join, &join.select_year(2001)).thresholds(), &[150.0]);
    }
}
