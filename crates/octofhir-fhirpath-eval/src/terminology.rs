//! Terminology hook for value set membership
//!
//! The engine never talks to a terminology server itself. Callers plug in a
//! [`TerminologyService`]; without one, `memberOf` degrades to empty and
//! records a warning on the evaluation context.

use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;

/// Failure reported by a terminology service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminologyError {
    #[error("Value set not found: {0}")]
    ValueSetNotFound(String),

    #[error("Terminology service failure: {0}")]
    Service(String),
}

/// Code validation against value sets
pub trait TerminologyService: Send + Sync {
    /// Whether `code` (optionally qualified by `system`) is in `value_set`
    fn validate_code(
        &self,
        system: Option<&str>,
        code: &str,
        value_set: &str,
    ) -> Result<bool, TerminologyError>;
}

/// Value sets held in memory, keyed by canonical URL
#[derive(Debug, Clone, Default)]
pub struct InMemoryTerminology {
    value_sets: IndexMap<String, HashSet<(String, String)>>,
}

impl InMemoryTerminology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `(system, code)` pairs to a value set, creating it if needed
    pub fn with_value_set<'a>(
        mut self,
        url: impl Into<String>,
        codes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let entry = self.value_sets.entry(url.into()).or_default();
        entry.extend(
            codes
                .into_iter()
                .map(|(system, code)| (system.to_string(), code.to_string())),
        );
        self
    }
}

impl TerminologyService for InMemoryTerminology {
    fn validate_code(
        &self,
        system: Option<&str>,
        code: &str,
        value_set: &str,
    ) -> Result<bool, TerminologyError> {
        let codes = self
            .value_sets
            .get(value_set)
            .ok_or_else(|| TerminologyError::ValueSetNotFound(value_set.to_string()))?;
        Ok(codes
            .iter()
            .any(|(s, c)| c == code && system.is_none_or(|system| system == s)))
    }
}
