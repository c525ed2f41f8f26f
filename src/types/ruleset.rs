use std::fmt;

use super::rule::{Metric, Rule};

/// Parsed rules grouped by target metric.
///
/// Within each metric, declaration order is preserved. Order is significant:
/// an `Unfilter` only cancels `Filter` rules declared before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    numerator: Vec<Rule>,
    denominator: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the sequence of its metric.
    pub fn push(&mut self, rule: Rule) {
        match rule.metric() {
            Metric::Numerator => self.numerator.push(rule),
            Metric::Denominator => self.denominator.push(rule),
        }
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    /// Rules targeting `metric`, in declaration order.
    #[must_use]
    pub fn rules(&self, metric: Metric) -> &[Rule] {
        match metric {
            Metric::Numerator => &self.numerator,
            Metric::Denominator => &self.denominator,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.numerator.len() + self.denominator.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numerator.is_empty() && self.denominator.is_empty()
    }

    /// All rules, numerator first.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.numerator.iter().chain(self.denominator.iter())
    }
}

impl Extend<Rule> for RuleSet {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        for rule in iter {
            self.push(rule);
        }
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        set.extend(iter);
        set
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} numerator rules, {} denominator rules)",
            self.numerator.len(),
            self.denominator.len(),
        )
    }
}
