pub mod naming;
pub mod overrides;
pub mod picking;
pub mod projected;
pub mod world;

pub use naming::*;
pub use overrides::*;
pub use picking::*;
pub use projected::*;
pub use world::*;
