pub mod choropleth;
pub mod layer;
pub mod points;
pub mod symbology;

pub use choropleth::*;
pub use layer::*;
pub use points::*;
pub use symbology::*;
