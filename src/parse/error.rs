use thiserror::Error;

use crate::Metric;

/// A free-text rule line that could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{metric} rules, line {line}: {message}")]
pub struct TextRuleError {
    pub metric: Metric,
    /// One-based line number within the metric's rule cell.
    pub line: usize,
    pub message: String,
}
