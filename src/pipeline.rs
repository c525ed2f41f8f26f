use crate::compile::{compile, Warning};
use crate::config::{ErrorPolicy, PipelineConfig};
use crate::emit::Emitter;
use crate::parse::{parse_records, records_from_metric_rows, TextRuleError};
use crate::{InvalidRuleError, MetricScriptError, RawRecord, RuleSet, ScriptDocument};

/// Everything one generation run produced.
#[derive(Debug, Clone)]
pub struct Generation {
    pub document: ScriptDocument,
    /// The rules the document was generated from.
    pub rules: RuleSet,
    /// Rows rejected by validation. Empty under the strict policy and for
    /// text input.
    pub errors: Vec<InvalidRuleError>,
    /// Free-text rule lines that could not be read or whose rows were
    /// rejected. Empty under the strict policy and for row input.
    pub text_errors: Vec<TextRuleError>,
    pub warnings: Vec<Warning>,
}

impl Generation {
    /// `true` when every input row became a rule.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.text_errors.is_empty()
    }
}

/// Parser, condition builder and emitter, run in sequence.
///
/// # Example
///
/// ```
/// use metric_script::{Pipeline, RawRecord};
///
/// let records = vec![
///     RawRecord::new()
///         .set("Metric", "Numerator")
///         .set("Field", "status")
///         .set("Operator", "Filter")
///         .set("Value", "active"),
/// ];
/// let generation = Pipeline::default().run(&records).unwrap();
/// assert!(generation.document.map_script.contains("== 'active'"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate a script document from rule rows.
    ///
    /// # Errors
    ///
    /// Returns [`MetricScriptError::InvalidRules`] if the policy is strict and
    /// any row was rejected, or [`MetricScriptError::Emit`] if rendering
    /// fails.
    pub fn run(&self, records: &[RawRecord]) -> Result<Generation, MetricScriptError> {
        let outcome = parse_records(records, &self.config.columns);
        if self.config.policy == ErrorPolicy::Strict && !outcome.errors.is_empty() {
            return Err(MetricScriptError::InvalidRules(outcome.errors));
        }
        self.finish(outcome.rules, outcome.errors, Vec::new())
    }

    /// Generate a script document from the two-column sheet layout, where
    /// each metric's rules are lines of text in a single cell.
    ///
    /// Lines the grammar rejects and lines whose rows fail validation are both
    /// reported as [`TextRuleError`]s, addressed by metric and line.
    ///
    /// # Errors
    ///
    /// Under the strict policy, returns [`MetricScriptError::TextRules`] if any
    /// line was rejected. Returns [`MetricScriptError::Emit`] if rendering
    /// fails.
    pub fn run_text<I, L, T>(&self, rows: I) -> Result<Generation, MetricScriptError>
    where
        I: IntoIterator<Item = (L, T)>,
        L: AsRef<str>,
        T: AsRef<str>,
    {
        let text = records_from_metric_rows(rows, &self.config.columns);
        let outcome = parse_records(&text.records, &self.config.columns);

        let mut text_errors = text.errors.clone();
        for err in &outcome.errors {
            if let Some(located) = text.locate(err) {
                // A multi-value line fans out into several rows that can fail
                // the same way.
                if !text_errors.contains(&located) {
                    text_errors.push(located);
                }
            }
        }

        if self.config.policy == ErrorPolicy::Strict && !text_errors.is_empty() {
            return Err(MetricScriptError::TextRules(text_errors));
        }
        self.finish(outcome.rules, Vec::new(), text_errors)
    }

    fn finish(
        &self,
        rules: RuleSet,
        errors: Vec<InvalidRuleError>,
        text_errors: Vec<TextRuleError>,
    ) -> Result<Generation, MetricScriptError> {
        let compiled = compile(&rules);
        let document = Emitter::new(self.config.emitter.clone()).emit(&compiled)?;
        log::debug!(
            "generated script from {} rules ({} rejected, {} warnings)",
            rules.len(),
            errors.len() + text_errors.len(),
            compiled.warnings.len()
        );

        Ok(Generation {
            document,
            rules,
            errors,
            text_errors,
            warnings: compiled.warnings,
        })
    }
}
