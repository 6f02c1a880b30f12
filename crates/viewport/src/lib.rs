//! Pan/zoom state for the 2D map canvas and its scripted animations.

pub mod animation;
pub mod arc;
pub mod easing;
pub mod engine;
pub mod transform;

pub use animation::*;
pub use arc::*;
pub use easing::*;
pub use engine::*;
pub use transform::*;
