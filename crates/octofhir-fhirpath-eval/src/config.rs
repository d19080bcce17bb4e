//! Evaluator configuration

use serde::{Deserialize, Serialize};

/// Capacities of the evaluator caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Compiled expressions, keyed by source text
    pub expressions: usize,
    /// Identifier tokens
    pub identifiers: usize,
    /// Literal values, keyed by literal text
    pub literals: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expressions: 512,
            identifiers: 2048,
            literals: 128,
        }
    }
}

/// Settings consumed by `FhirPathEvaluator::with_config`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub cache: CacheConfig,
    /// Maximum nesting of sub-expression evaluation
    pub max_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            max_depth: 512,
        }
    }
}
