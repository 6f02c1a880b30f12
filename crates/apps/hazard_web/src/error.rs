use formats::FormatError;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Fetch { url: String, message: String },
    Http { url: String, status: u16 },
    Parse { url: String, message: String },
    /// The geometry file loaded but held no drawable regions.
    MissingGeometry,
    Dom(String),
}

impl LoadError {
    pub fn parse(url: &str, err: FormatError) -> Self {
        LoadError::Parse {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch { url, message } => write!(f, "could not fetch {url}: {message}"),
            LoadError::Http { url, status } => write!(f, "{url} returned HTTP {status}"),
            LoadError::Parse { url, message } => write!(f, "could not read {url}: {message}"),
            LoadError::MissingGeometry => write!(f, "map geometry has no drawable regions"),
            LoadError::Dom(msg) => write!(f, "page is missing {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}
