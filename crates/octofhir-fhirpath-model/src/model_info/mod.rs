//! ModelInfo abstraction for data model definitions

mod types;

pub use types::*;
