pub mod model;
pub mod visit;

pub use model::*;
