use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// Which of the two computed counts a rule contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Numerator,
    Denominator,
}

impl Metric {
    /// Both metrics, in output order.
    pub const ALL: [Metric; 2] = [Metric::Numerator, Metric::Denominator];

    /// Resolve a metric from a free-form label such as `"Numerator"` or
    /// `"  denominator rules "`. Matching is case-insensitive and looks for the
    /// metric name anywhere in the label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Metric> {
        let label = label.trim().to_ascii_lowercase();
        if label.contains("numerator") {
            Some(Metric::Numerator)
        } else if label.contains("denominator") {
            Some(Metric::Denominator)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Numerator => "numerator",
            Metric::Denominator => "denominator",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed rule vocabulary, without payloads.
///
/// Used wherever only the kind of a rule matters: error reporting and the
/// leaves of a [`Predicate`](super::Predicate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Filter,
    Exclude,
    Unfilter,
    Contain,
    Exists,
}

impl OperatorKind {
    /// Resolve an operator from the text of an operator cell.
    #[must_use]
    pub fn from_label(label: &str) -> Option<OperatorKind> {
        match label.trim().to_ascii_lowercase().as_str() {
            "filter" => Some(OperatorKind::Filter),
            "exclude" => Some(OperatorKind::Exclude),
            "unfilter" => Some(OperatorKind::Unfilter),
            "contain" | "contains" => Some(OperatorKind::Contain),
            "exists" => Some(OperatorKind::Exists),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Filter => "Filter",
            OperatorKind::Exclude => "Exclude",
            OperatorKind::Unfilter => "Unfilter",
            OperatorKind::Contain => "Contain",
            OperatorKind::Exists => "Exists",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule operator together with exactly the payload it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Document counts only if the field equals the value.
    Filter(Value),
    /// Document is disqualified if the field equals the value.
    Exclude(Value),
    /// Cancels every earlier `Filter` on the same field.
    Unfilter,
    /// Document counts if the field is one of the values. Never empty.
    Contain(Vec<Value>),
    /// Document counts if the field is present.
    Exists,
}

impl Operator {
    #[must_use]
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Filter(_) => OperatorKind::Filter,
            Operator::Exclude(_) => OperatorKind::Exclude,
            Operator::Unfilter => OperatorKind::Unfilter,
            Operator::Contain(_) => OperatorKind::Contain,
            Operator::Exists => OperatorKind::Exists,
        }
    }
}

/// A single parsed rule row. Immutable once built.
///
/// Rules are normally produced by [`parse_records`](crate::parse::parse_records).
/// The [`numerator()`] and [`denominator()`] helpers build them directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    field: String,
    operator: Operator,
    metric: Metric,
}

impl Rule {
    pub(crate) fn new(metric: Metric, field: String, operator: Operator) -> Self {
        Self {
            field,
            operator,
            metric,
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.metric, self.operator.kind(), self.field)?;
        match &self.operator {
            Operator::Filter(v) | Operator::Exclude(v) => write!(f, " {v}"),
            Operator::Contain(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, " [{}]", rendered.join(", "))
            }
            Operator::Unfilter | Operator::Exists => Ok(()),
        }
    }
}

/// Intermediate builder for rules on one field.
/// Created by [`numerator()`] or [`denominator()`].
#[derive(Debug, Clone)]
pub struct FieldRule {
    metric: Metric,
    field: String,
}

impl FieldRule {
    #[must_use]
    pub fn filter(self, value: impl Into<Value>) -> Rule {
        Rule::new(self.metric, self.field, Operator::Filter(value.into()))
    }

    #[must_use]
    pub fn exclude(self, value: impl Into<Value>) -> Rule {
        Rule::new(self.metric, self.field, Operator::Exclude(value.into()))
    }

    #[must_use]
    pub fn unfilter(self) -> Rule {
        Rule::new(self.metric, self.field, Operator::Unfilter)
    }

    /// An empty list is accepted here and rejected by the emitter.
    #[must_use]
    pub fn contain<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Rule {
        let values = values.into_iter().map(Into::into).collect();
        Rule::new(self.metric, self.field, Operator::Contain(values))
    }

    #[must_use]
    pub fn exists(self) -> Rule {
        Rule::new(self.metric, self.field, Operator::Exists)
    }
}

/// Start a numerator rule on `field`.
///
/// Builders do not validate. A blank field or an empty `Contain` list surfaces
/// as [`EmitError::MalformedTest`](crate::EmitError::MalformedTest) when the
/// rule set is emitted.
#[must_use]
pub fn numerator(field: &str) -> FieldRule {
    field_rule(Metric::Numerator, field)
}

/// Start a denominator rule on `field`. See [`numerator()`].
#[must_use]
pub fn denominator(field: &str) -> FieldRule {
    field_rule(Metric::Denominator, field)
}

fn field_rule(metric: Metric, field: &str) -> FieldRule {
    FieldRule {
        metric,
        field: field.to_owned(),
    }
}
