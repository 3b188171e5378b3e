//! Writing filtered pixels into panel buffers.

mod pack;

pub(crate) use pack::{brighten, pack};
pub use pack::copy_rows_strided;
