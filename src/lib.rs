//! Compiles tabular metric rules into an Elasticsearch `scripted_metric`
//! aggregation that counts a numerator and a denominator in one pass.

mod compile;
pub mod config;
pub mod emit;
mod error;
pub mod parse;
mod pipeline;
mod types;

pub use compile::{build_predicate, compile, CompiledMetrics, Warning};
pub use config::{ColumnConfig, EmitterConfig, ErrorPolicy, FieldAccess, Measure, PipelineConfig};
pub use emit::Emitter;
pub use error::MetricScriptError;
pub use pipeline::{Generation, Pipeline};
pub use types::{
    denominator, numerator, Cell, EmitError, FieldRule, FieldTest, InvalidRuleError, Metric,
    Operator, OperatorKind, Predicate, RawRecord, Rule, RuleSet, RuleViolation, ScriptDocument,
    Value,
};

/// Generate a script document from rule rows with the default configuration.
///
/// # Errors
///
/// Returns [`MetricScriptError::Emit`] if rendering fails.
pub fn generate(records: &[RawRecord]) -> Result<Generation, MetricScriptError> {
    Pipeline::default().run(records)
}
