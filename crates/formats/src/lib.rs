pub mod error;
pub mod events;
pub mod formula;
pub mod geojson;
pub mod manifest;
pub mod series;
pub mod table;

pub use error::*;
pub use events::*;
pub use formula::*;
pub use geojson::*;
pub use manifest::*;
pub use series::*;
pub use table::*;
