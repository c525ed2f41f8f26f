mod document;
mod error;
mod predicate;
mod record;
mod rule;
mod ruleset;
mod value;

pub use document::ScriptDocument;
pub use error::{EmitError, InvalidRuleError, RuleViolation};
pub use predicate::{FieldTest, Predicate};
pub use record::{Cell, RawRecord};
pub use rule::{denominator, numerator, FieldRule, Metric, Operator, OperatorKind, Rule};
pub use ruleset::RuleSet;
pub use value::Value;
