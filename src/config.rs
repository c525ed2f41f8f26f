use serde::{Deserialize, Serialize};

/// Column names a workbook reader uses for each rule attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub field_column: String,
    pub operator_column: String,
    pub value_column: String,
    pub metric_column: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            field_column: "Field".to_owned(),
            operator_column: "Operator".to_owned(),
            value_column: "Value".to_owned(),
            metric_column: "Metric".to_owned(),
        }
    }
}

/// How the generated script reads a document field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    /// `params['_source']['field']`. Works on unindexed and text fields.
    #[default]
    Source,
    /// `doc['field'].value`. Requires doc values on the field.
    DocValues,
}

/// What a metric accumulates for each matching document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Add one per matching document.
    #[default]
    Count,
    /// Add the numeric value of `field`; documents without it add nothing.
    Sum { field: String },
}

/// Settings for the script emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub field_access: FieldAccess,
    /// Key of the numerator in the state map and in the reduce result.
    pub numerator_key: String,
    /// Key of the denominator in the state map and in the reduce result.
    pub denominator_key: String,
    pub numerator_measure: Measure,
    pub denominator_measure: Measure,
    /// When set, the reduce result also carries `numerator / denominator` as a
    /// percentage rounded down to two decimals, or `null` for a zero
    /// denominator.
    pub ratio_key: Option<String>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            field_access: FieldAccess::default(),
            numerator_key: "numerator".to_owned(),
            denominator_key: "denominator".to_owned(),
            numerator_measure: Measure::Count,
            denominator_measure: Measure::Count,
            ratio_key: None,
        }
    }
}

/// What the pipeline does when some rule rows are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Generate from the valid rows and report the rejected ones.
    #[default]
    Collect,
    /// Abort before emission if any row was rejected.
    Strict,
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnConfig,
    pub emitter: EmitterConfig,
    pub policy: ErrorPolicy,
}

impl PipelineConfig {
    /// Load a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MetricScriptError::Json`](crate::MetricScriptError::Json) if
    /// the input is not a valid configuration document.
    pub fn from_json(input: &str) -> Result<Self, crate::MetricScriptError> {
        Ok(serde_json::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_columns() {
        let columns = ColumnConfig::default();
        assert_eq!(columns.field_column, "Field");
        assert_eq!(columns.operator_column, "Operator");
        assert_eq!(columns.value_column, "Value");
        assert_eq!(columns.metric_column, "Metric");
    }

    #[test]
    fn empty_json_is_default() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn partial_json_overrides() {
        let config = PipelineConfig::from_json(
            r#"{
                "columns": { "field_column": "Column" },
                "emitter": {
                    "field_access": "doc_values",
                    "numerator_measure": { "sum": { "field": "amount" } },
                    "ratio_key": "performance"
                },
                "policy": "strict"
            }"#,
        )
        .unwrap();
        assert_eq!(config.columns.field_column, "Column");
        assert_eq!(config.columns.value_column, "Value");
        assert_eq!(config.emitter.field_access, FieldAccess::DocValues);
        assert_eq!(
            config.emitter.numerator_measure,
            Measure::Sum {
                field: "amount".into()
            }
        );
        assert_eq!(config.emitter.denominator_measure, Measure::Count);
        assert_eq!(config.emitter.ratio_key.as_deref(), Some("performance"));
        assert_eq!(config.policy, ErrorPolicy::Strict);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = PipelineConfig::from_json(r#"{"policy": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, crate::MetricScriptError::Json(_)));
    }
}
