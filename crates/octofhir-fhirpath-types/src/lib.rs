//! FHIRPath type system
//!
//! - [`TypeRegistry`]: System and FHIR namespaces with single inheritance
//! - [`SystemValue`]: runtime primitive values with comparison and arithmetic
//! - Precision-aware temporal types and UCUM quantities

pub mod arithmetic;
pub mod error;
pub mod quantity;
pub mod registry;
pub mod temporal;
pub mod value;

pub use error::{ValueError, ValueResult};
pub use quantity::{CalendarUnit, Quantity};
pub use registry::{FhirPathType, Namespace, TypeRegistry};
pub use temporal::{DateTimePrecision, FhirPathDate, FhirPathDateTime, FhirPathTime};
pub use value::SystemValue;
