use std::fmt;

use crate::{FieldTest, Metric, Operator, OperatorKind, Predicate, Rule, RuleSet};

/// Non-fatal findings reported alongside the generated predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The metric had no rules, so every document counts towards it.
    EmptyRuleSet { metric: Metric },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyRuleSet { metric } => {
                write!(f, "{metric} has no rules; every document counts")
            }
        }
    }
}

/// One resolved predicate per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMetrics {
    pub numerator: Predicate,
    pub denominator: Predicate,
    pub warnings: Vec<Warning>,
}

impl CompiledMetrics {
    #[must_use]
    pub fn predicate(&self, metric: Metric) -> &Predicate {
        match metric {
            Metric::Numerator => &self.numerator,
            Metric::Denominator => &self.denominator,
        }
    }
}

/// Resolve each metric's rules into a single predicate.
#[must_use]
pub fn compile(rules: &RuleSet) -> CompiledMetrics {
    let mut warnings = Vec::new();
    let mut build = |metric: Metric| {
        let metric_rules = rules.rules(metric);
        if metric_rules.is_empty() {
            log::warn!("{metric} has no rules; it will count every document");
            warnings.push(Warning::EmptyRuleSet { metric });
        }
        let predicate = build_predicate(metric_rules);
        log::debug!("{metric} predicate: {predicate}");
        predicate
    };
    let numerator = build(Metric::Numerator);
    let denominator = build(Metric::Denominator);

    CompiledMetrics {
        numerator,
        denominator,
        warnings,
    }
}

/// Resolve one metric's rules into a predicate.
///
/// Rules are grouped by field in order of first appearance. Each field's
/// sequence is folded left to right into an inclusion group (Filter,
/// Contain and Exists, OR-ed) and an exclusion group (Exclude, OR-ed and
/// negated); an Unfilter drops the Filter tests declared before it. Field
/// predicates are AND-ed. With no active constraint the result is
/// [`Predicate::Always`].
#[must_use]
pub fn build_predicate(rules: &[Rule]) -> Predicate {
    let parts = group_by_field(rules).into_iter().filter_map(|(field, rules)| {
        rules
            .into_iter()
            .fold(FieldResolution::default(), FieldResolution::apply)
            .into_predicate(field)
    });
    Predicate::all(parts)
}

/// Fields in order of first appearance, each with its rules in declaration
/// order.
fn group_by_field(rules: &[Rule]) -> Vec<(&str, Vec<&Rule>)> {
    let mut groups: Vec<(&str, Vec<&Rule>)> = Vec::new();
    for rule in rules {
        match groups.iter_mut().find(|(field, _)| *field == rule.field()) {
            Some((_, group)) => group.push(rule),
            None => groups.push((rule.field(), vec![rule])),
        }
    }
    groups
}

#[derive(Debug, Default)]
struct FieldResolution {
    includes: Vec<FieldTest>,
    excludes: Vec<FieldTest>,
}

impl FieldResolution {
    fn apply(mut self, rule: &Rule) -> Self {
        let field = rule.field();
        match rule.operator() {
            Operator::Filter(value) => self.includes.push(FieldTest::equals(field, value.clone())),
            Operator::Contain(values) => self.includes.push(FieldTest::one_of(field, values.clone())),
            Operator::Exists => self.includes.push(FieldTest::exists(field)),
            Operator::Exclude(value) => self.excludes.push(FieldTest::equals(field, value.clone())),
            Operator::Unfilter => {
                let before = self.includes.len();
                self.includes.retain(|t| t.operator != OperatorKind::Filter);
                log::trace!(
                    "unfilter on '{field}' cancelled {} filter(s)",
                    before - self.includes.len()
                );
            }
        }
        self
    }

    fn into_predicate(self, field: &str) -> Option<Predicate> {
        let include = Predicate::any(self.includes.into_iter().map(Predicate::Test));
        let exclude = Predicate::any(self.excludes.into_iter().map(Predicate::Test)).map(|p| !p);
        let resolved = match (include, exclude) {
            (Some(i), Some(e)) => Some(i.and(e)),
            (Some(p), None) | (None, Some(p)) => Some(p),
            (None, None) => None,
        };
        if resolved.is_none() {
            log::trace!("field '{field}' has no active constraint");
        }
        resolved
    }
}
