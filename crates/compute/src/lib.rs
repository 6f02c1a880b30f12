pub mod analysis;
pub mod join;

pub use analysis::*;
pub use join::*;
