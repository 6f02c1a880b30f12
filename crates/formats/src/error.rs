#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
    EmptyTable,
    MissingColumn(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            FormatError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FormatError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            FormatError::EmptyTable => write!(f, "table has no header row"),
            FormatError::MissingColumn(what) => write!(f, "no column found for {what}"),
        }
    }
}

impl std::error::Error for FormatError {}
