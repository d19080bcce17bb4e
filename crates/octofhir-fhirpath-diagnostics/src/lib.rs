//! FHIRPath diagnostics and error handling
//!
//! Error codes, source locations, parse errors and the `Diagnostic` record
//! that evaluation collects as non-fatal issues.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
