use thiserror::Error;

use crate::parse::TextRuleError;
use crate::{EmitError, InvalidRuleError};

/// Unified error type for the generation pipeline.
///
/// Returned by [`Pipeline::run()`](crate::Pipeline::run) and the other
/// convenience entry points.
#[derive(Debug, Error)]
pub enum MetricScriptError {
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Raised only under [`ErrorPolicy::Strict`](crate::ErrorPolicy::Strict).
    #[error("{} rule rows failed validation; first: {}", .0.len(), first(.0))]
    InvalidRules(Vec<InvalidRuleError>),

    /// Raised only under [`ErrorPolicy::Strict`](crate::ErrorPolicy::Strict).
    #[error("{} rule lines could not be read; first: {}", .0.len(), first(.0))]
    TextRules(Vec<TextRuleError>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn first<E: ToString>(errors: &[E]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}
