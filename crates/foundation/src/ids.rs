/// Canonical region identifier used to join tabular data to map features.
///
/// ISO-3166 alpha-3 for country maps, a cleaned prefecture name for Japan.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        RegionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join key for one `(region, year)` observation.
    pub fn year_key(&self, year: i32) -> String {
        format!("{}::{}", self.0, year)
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        RegionId(s.to_string())
    }
}
