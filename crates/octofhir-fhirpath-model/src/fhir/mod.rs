//! FHIR ModelInfo support
//!
//! This module provides the embedded FHIR R4 ModelInfo.

pub mod r4;

pub use r4::*;
