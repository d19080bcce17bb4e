//! Current date and time functions
//!
//! Each call reads the local clock, so results differ between calls.

use crate::registry::FunctionRegistryBuilder;
use chrono::Local;
use octofhir_fhirpath_model::Collection;
use octofhir_fhirpath_types::{FhirPathDate, FhirPathDateTime, FhirPathTime, SystemValue};

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function("now", 0, 0, |_, _, _| {
            let now = Local::now().fixed_offset();
            Ok(Collection::from_value(SystemValue::DateTime(
                FhirPathDateTime::from_chrono(&now),
            )))
        })
        .function("today", 0, 0, |_, _, _| {
            let today = Local::now().date_naive();
            Ok(Collection::from_value(SystemValue::Date(
                FhirPathDate::from_naive(today),
            )))
        })
        .function("timeOfDay", 0, 0, |_, _, _| {
            let time = Local::now().time();
            Ok(Collection::from_value(SystemValue::Time(
                FhirPathTime::from_naive(time),
            )))
        })
}
