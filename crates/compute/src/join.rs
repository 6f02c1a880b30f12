//! Dense `(region, year)` join between tabular series and map regions.

use std::collections::{BTreeMap, HashMap};

use formats::{DecayConfig, TimeSeriesRow};
use foundation::ids::RegionId;
use foundation::time::YearRange;
use scene::naming::{NameResolver, clean_name};

use crate::analysis::TemporalAnalysis;

/// Per-region decay rates with a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayRates {
    pub default_rate: f64,
    pub per_region: HashMap<RegionId, f64>,
}

impl DecayRates {
    pub fn uniform(rate: f64) -> Self {
        Self {
            default_rate: rate,
            per_region: HashMap::new(),
        }
    }

    /// Override keys are canonicalized the same way as table rows.
    pub fn from_config(config: &DecayConfig, resolver: &NameResolver) -> Self {
        let per_region = config
            .per_region
            .iter()
            .filter_map(|(raw, rate)| Some((resolver.canonicalize(raw)?, *rate)))
            .collect();
        Self {
            default_rate: config.default_rate,
            per_region,
        }
    }

    pub fn rate_for(&self, region: &RegionId) -> f64 {
        self.per_region
            .get(region)
            .copied()
            .unwrap_or(self.default_rate)
    }
}

/// An observation already keyed by canonical id.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRow {
    pub region: RegionId,
    pub name: Option<String>,
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenseSeries {
    pub region: RegionId,
    pub name: Option<String>,
    pub range: YearRange,
    /// Exactly one entry per year of `range`.
    pub values: Vec<f64>,
}

impl DenseSeries {
    pub fn value(&self, year: i32) -> Option<f64> {
        self.values.get(self.range.offset(year)?).copied()
    }
}

/// Every region densified over the configured year range.
#[derive(Debug, Clone, Default)]
pub struct DataJoin {
    range: Option<YearRange>,
    series: BTreeMap<RegionId, DenseSeries>,
    /// Rows without a canonical id, densified by cleaned name. Reachable
    /// only through the name fallback.
    named: BTreeMap<String, Vec<f64>>,
    /// Raw rows that did not canonicalize.
    pub unresolved: usize,
}

impl DataJoin {
    pub fn build(rows: impl IntoIterator<Item = JoinRow>, range: YearRange, decay: &DecayRates) -> Self {
        let mut grouped: BTreeMap<RegionId, (Option<String>, Vec<(i32, f64)>)> = BTreeMap::new();
        for row in rows {
            let entry = grouped.entry(row.region).or_default();
            if entry.0.is_none() {
                entry.0 = row.name;
            }
            entry.1.push((row.year, row.value));
        }

        let series = grouped
            .into_iter()
            .map(|(region, (name, obs))| {
                let values = TemporalAnalysis::densify(&obs, range, decay.rate_for(&region));
                let dense = DenseSeries {
                    region: region.clone(),
                    name,
                    range,
                    values,
                };
                (region, dense)
            })
            .collect();

        Self {
            range: Some(range),
            series,
            named: BTreeMap::new(),
            unresolved: 0,
        }
    }

    /// Canonicalizes raw table rows, then builds the dense join.
    ///
    /// Rows that do not canonicalize but carry a name are kept under that
    /// name so features can still match them by display name.
    pub fn from_series(
        rows: &[TimeSeriesRow],
        resolver: &NameResolver,
        range: YearRange,
        decay: &DecayRates,
    ) -> Self {
        let mut unresolved = 0;
        let mut by_name: BTreeMap<String, Vec<(i32, f64)>> = BTreeMap::new();
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            let region = resolver
                .canonicalize(&row.region)
                .or_else(|| row.name.as_deref().and_then(|n| resolver.canonicalize(n)));
            match region {
                Some(region) => keyed.push(JoinRow {
                    region,
                    name: row.name.clone().or_else(|| Some(row.region.clone())),
                    year: row.year,
                    value: row.value,
                }),
                None => {
                    tracing::debug!("series row {:?} has no canonical region", row.region);
                    unresolved += 1;
                    let key = row.name.as_deref().map(name_key).unwrap_or_default();
                    if !key.is_empty() {
                        by_name.entry(key).or_default().push((row.year, row.value));
                    }
                }
            }
        }
        if unresolved > 0 {
            tracing::warn!(
                "{unresolved} series rows could not be matched to a region id; {} names kept for name lookup",
                by_name.len()
            );
        }
        let mut join = Self::build(keyed, range, decay);
        join.named = by_name
            .into_iter()
            .map(|(name, obs)| {
                let values = TemporalAnalysis::densify(&obs, range, decay.default_rate);
                (name, values)
            })
            .collect();
        join.unresolved = unresolved;
        join
    }

    pub fn range(&self) -> Option<YearRange> {
        self.range
    }

    pub fn series(&self, region: &RegionId) -> Option<&DenseSeries> {
        self.series.get(region)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Every dense value across all regions and years, name-keyed series included.
    pub fn all_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.series
            .values()
            .map(|s| &s.values)
            .chain(self.named.values())
            .flat_map(|values| values.iter().copied())
    }

    /// Lookup tables for one year. Linear in the number of regions.
    pub fn select_year(&self, year: i32) -> YearSlice {
        let mut by_key = HashMap::with_capacity(self.series.len());
        let mut by_name = HashMap::new();
        for dense in self.series.values() {
            let Some(value) = dense.value(year) else {
                continue;
            };
            by_key.insert(dense.region.year_key(year), value);
            if let Some(name) = &dense.name {
                by_name.entry(name_key(name)).or_insert(value);
            }
        }
        let mut named = Vec::new();
        if let Some(offset) = self.range.and_then(|r| r.offset(year)) {
            for (name, values) in &self.named {
                if let Some(&value) = values.get(offset) {
                    by_name.entry(name.clone()).or_insert(value);
                    named.push(value);
                }
            }
        }
        YearSlice {
            year,
            by_key,
            by_name,
            named,
        }
    }
}

fn name_key(name: &str) -> String {
    clean_name(name)
}

/// Values for the selected year, keyed by `"{region}::{year}"` with a
/// case-insensitive name fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSlice {
    pub year: i32,
    by_key: HashMap<String, f64>,
    by_name: HashMap<String, f64>,
    /// Values of name-keyed series, for per-year binning.
    named: Vec<f64>,
}

impl YearSlice {
    pub fn lookup(&self, region: Option<&RegionId>, name: &str) -> Option<f64> {
        region
            .and_then(|id| self.by_key.get(&id.year_key(self.year)))
            .or_else(|| {
                let key = name_key(name);
                (!key.is_empty()).then(|| self.by_name.get(&key)).flatten()
            })
            .copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.by_key.values().chain(self.named.iter()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
