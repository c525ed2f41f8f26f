//! Rendering predicates into Painless `scripted_metric` phases.
//!
//! Every piece of script text goes through the helpers in this module:
//! literals and field names are quoted by [`literal`] and [`quote`], and
//! document reads are built in one place from the configured
//! [`FieldAccess`]. Nothing outside this module concatenates script
//! fragments.

use crate::compile::CompiledMetrics;
use crate::config::{EmitterConfig, FieldAccess, Measure};
use crate::{EmitError, FieldTest, OperatorKind, Predicate, ScriptDocument, Value};

/// Turns resolved predicates into a [`ScriptDocument`].
#[derive(Debug, Clone, Default)]
pub struct Emitter {
    config: EmitterConfig,
}

impl Emitter {
    #[must_use]
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Render all four phases.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::DuplicateKey`] if two output keys collide, or
    /// another [`EmitError`] if either predicate contains a leaf that has no
    /// rendering. No partial document is produced.
    pub fn emit(&self, metrics: &CompiledMetrics) -> Result<ScriptDocument, EmitError> {
        self.check_keys()?;
        let numerator = self.render(&metrics.numerator)?;
        let denominator = self.render(&metrics.denominator)?;
        log::debug!("rendered numerator condition: {numerator}");
        log::debug!("rendered denominator condition: {denominator}");

        Ok(ScriptDocument {
            init_script: self.init_script(),
            map_script: self.map_script(&numerator, &denominator),
            combine_script: self.combine_script(),
            reduce_script: self.reduce_script(),
            numerator_key: self.config.numerator_key.clone(),
            denominator_key: self.config.denominator_key.clone(),
        })
    }

    fn check_keys(&self) -> Result<(), EmitError> {
        let config = &self.config;
        let mut keys = vec![&config.numerator_key, &config.denominator_key];
        keys.extend(&config.ratio_key);
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(EmitError::DuplicateKey {
                    key: (*key).clone(),
                });
            }
        }
        Ok(())
    }

    /// Render a predicate as a Painless boolean expression.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::UnsupportedOperator`] for an `Unfilter` leaf and
    /// [`EmitError::MalformedTest`] for a leaf whose value count does not fit
    /// its operator.
    pub fn render(&self, predicate: &Predicate) -> Result<String, EmitError> {
        let rendered = match predicate {
            Predicate::Always => "true".to_owned(),
            Predicate::Test(test) => self.render_test(test)?,
            Predicate::And(a, b) => format!("({} && {})", self.render(a)?, self.render(b)?),
            Predicate::Or(a, b) => format!("({} || {})", self.render(a)?, self.render(b)?),
            Predicate::Not(inner) => format!("!({})", self.render(inner)?),
        };
        log::trace!("{predicate} => {rendered}");
        Ok(rendered)
    }

    fn render_test(&self, test: &FieldTest) -> Result<String, EmitError> {
        if test.field.trim().is_empty() {
            return Err(malformed(test, "field name is empty".to_owned()));
        }
        let access = self.field_access(&test.field);
        let comparison = match test.operator {
            OperatorKind::Filter => format!("{access} == {}", literal(single(test)?)),
            OperatorKind::Exclude => format!("{access} != {}", literal(single(test)?)),
            // Same `==` as Filter, so numeric values compare by value
            // whatever boxed type the document holds.
            OperatorKind::Contain => match test.values.as_slice() {
                [] => return Err(malformed(test, "expected at least 1 value, got 0".to_owned())),
                [value] => format!("{access} == {}", literal(value)),
                values => {
                    let alternatives: Vec<String> = values
                        .iter()
                        .map(|v| format!("{access} == {}", literal(v)))
                        .collect();
                    format!("({})", alternatives.join(" || "))
                }
            },
            OperatorKind::Exists => {
                if !test.values.is_empty() {
                    return Err(malformed(test, format!("expected no values, got {}", test.values.len())));
                }
                return Ok(self.presence(&test.field));
            }
            OperatorKind::Unfilter => {
                return Err(EmitError::UnsupportedOperator {
                    field: test.field.clone(),
                    operator: test.operator,
                });
            }
        };
        Ok(self.guard(test, comparison))
    }

    /// Doc-values reads throw on documents without the field, so they only
    /// happen behind a presence check. A missing field fails an inclusion and
    /// passes an exclusion.
    fn guard(&self, test: &FieldTest, comparison: String) -> String {
        match self.config.field_access {
            FieldAccess::Source => comparison,
            FieldAccess::DocValues => {
                let presence = self.presence(&test.field);
                if test.operator == OperatorKind::Exclude {
                    format!("(!{presence} || {comparison})")
                } else {
                    format!("({presence} && {comparison})")
                }
            }
        }
    }

    /// Expression reading `field` from the current document.
    fn field_access(&self, field: &str) -> String {
        match self.config.field_access {
            FieldAccess::Source => format!("params['_source'][{}]", quote(field)),
            FieldAccess::DocValues => format!("doc[{}].value", quote(field)),
        }
    }

    /// Expression that is true when `field` has a value.
    fn presence(&self, field: &str) -> String {
        match self.config.field_access {
            FieldAccess::Source => format!("{} != null", self.field_access(field)),
            FieldAccess::DocValues => {
                let name = quote(field);
                format!("(doc.containsKey({name}) && doc[{name}].size() > 0)")
            }
        }
    }

    fn state(key: &str) -> String {
        format!("state[{}]", quote(key))
    }

    fn init_script(&self) -> String {
        format!(
            "{} = {}; {} = {};",
            Self::state(&self.config.numerator_key),
            zero(&self.config.numerator_measure),
            Self::state(&self.config.denominator_key),
            zero(&self.config.denominator_measure),
        )
    }

    fn map_script(&self, numerator: &str, denominator: &str) -> String {
        format!(
            "if ({numerator}) {{ {} }} if ({denominator}) {{ {} }}",
            self.accumulate(&self.config.numerator_key, &self.config.numerator_measure),
            self.accumulate(&self.config.denominator_key, &self.config.denominator_measure),
        )
    }

    fn accumulate(&self, key: &str, measure: &Measure) -> String {
        let target = Self::state(key);
        match measure {
            Measure::Count => format!("{target} += 1;"),
            Measure::Sum { field } => format!(
                "if ({}) {{ {target} += {}; }}",
                self.presence(field),
                self.field_access(field)
            ),
        }
    }

    fn combine_script(&self) -> String {
        format!(
            "return [{}: {}, {}: {}];",
            quote(&self.config.numerator_key),
            Self::state(&self.config.numerator_key),
            quote(&self.config.denominator_key),
            Self::state(&self.config.denominator_key),
        )
    }

    fn reduce_script(&self) -> String {
        let num_key = quote(&self.config.numerator_key);
        let den_key = quote(&self.config.denominator_key);
        let mut script = format!(
            "def numerator = {}; def denominator = {}; \
             for (s in states) {{ if (s != null) {{ numerator += s[{num_key}]; denominator += s[{den_key}]; }} }} ",
            zero(&self.config.numerator_measure),
            zero(&self.config.denominator_measure),
        );
        match &self.config.ratio_key {
            Some(ratio_key) => script.push_str(&format!(
                "def ratio = null; \
                 if (denominator != 0) {{ ratio = Math.floor((double) numerator / denominator * 10000.0) / 100.0; }} \
                 return [{num_key}: numerator, {den_key}: denominator, {}: ratio];",
                quote(ratio_key)
            )),
            None => script.push_str(&format!(
                "return [{num_key}: numerator, {den_key}: denominator];"
            )),
        }
        script
    }
}

fn single(test: &FieldTest) -> Result<&Value, EmitError> {
    match test.values.as_slice() {
        [value] => Ok(value),
        values => Err(malformed(test, format!("expected 1 value, got {}", values.len()))),
    }
}

fn malformed(test: &FieldTest, reason: String) -> EmitError {
    EmitError::MalformedTest {
        field: test.field.clone(),
        operator: test.operator,
        reason,
    }
}

fn zero(measure: &Measure) -> &'static str {
    match measure {
        Measure::Count => "0L",
        Measure::Sum { .. } => "0.0",
    }
}

/// Single-quoted Painless string literal.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Painless literal for a rule value, keeping its type.
#[must_use]
pub fn literal(value: &Value) -> String {
    match value {
        Value::Int(v) => format!("{v}L"),
        Value::Float(v) if v.is_nan() => "Double.NaN".to_owned(),
        Value::Float(v) if v.is_infinite() => {
            if v.is_sign_positive() {
                "Double.POSITIVE_INFINITY".to_owned()
            } else {
                "Double.NEGATIVE_INFINITY".to_owned()
            }
        }
        Value::Float(v) => format!("{v:?}"),
        Value::Bool(v) => v.to_string(),
        Value::String(v) => quote(v),
    }
}
