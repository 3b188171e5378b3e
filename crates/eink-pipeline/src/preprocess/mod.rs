//! Geometry stages that run before filtering.

mod resize;

pub use resize::scale_fit;
