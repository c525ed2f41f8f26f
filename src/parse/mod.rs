//! Turning workbook input into validated rules.
//!
//! Two input shapes are supported: one row per rule with separate field,
//! operator, value and metric columns ([`parse_records`]), and the older
//! layout with one free-text cell of numbered rule lines per metric
//! ([`parse_rule_text`], [`records_from_metric_rows`]). The text reader only
//! produces rows; validation always goes through [`parse_records`].

mod error;
mod rows;
mod text;

pub use error::TextRuleError;
pub use rows::{parse_record, parse_records, ParseOutcome};
pub use text::{parse_rule_text, records_from_metric_rows, TextRules};
