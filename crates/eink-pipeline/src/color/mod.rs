//! Tone curves.

mod gamma;

pub use gamma::GammaTables;
