use thiserror::Error;

use super::OperatorKind;

/// The constraint a rejected rule row violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("field is empty")]
    EmptyField,

    #[error("unknown operator '{found}'")]
    UnknownOperator { found: String },

    #[error("unknown metric '{found}'; expected numerator or denominator")]
    UnknownMetric { found: String },

    #[error("{operator} requires a value")]
    MissingValue { operator: OperatorKind },

    #[error("{operator} takes a single value, got {count}")]
    UnexpectedList { operator: OperatorKind, count: usize },

    #[error("{operator} requires a non-empty list of values")]
    EmptyValueList { operator: OperatorKind },
}

/// A malformed or unrecognized rule row. Collected, not fatal.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid rule at row {row}: {violation}")]
pub struct InvalidRuleError {
    /// Zero-based position of the row in the input sequence.
    pub row: usize,
    pub violation: RuleViolation,
}

/// Failures while rendering a predicate into script text. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    #[error("operator {operator} on field '{field}' has no script rendering")]
    UnsupportedOperator {
        field: String,
        operator: OperatorKind,
    },

    #[error("malformed {operator} test on field '{field}': {reason}")]
    MalformedTest {
        field: String,
        operator: OperatorKind,
        reason: String,
    },

    #[error("output key '{key}' is used for more than one value")]
    DuplicateKey { key: String },
}
