use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, repeat_till, separated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use crate::config::ColumnConfig;
use crate::{Cell, InvalidRuleError, Metric, OperatorKind, RawRecord};

use super::error::TextRuleError;

/// Raw records recovered from free-text rule cells, plus the lines that could
/// not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRules {
    pub records: Vec<RawRecord>,
    /// Metric and one-based line each record came from, parallel to `records`.
    pub lines: Vec<(Metric, usize)>,
    pub errors: Vec<TextRuleError>,
}

impl TextRules {
    fn append(&mut self, other: TextRules) {
        self.records.extend(other.records);
        self.lines.extend(other.lines);
        self.errors.extend(other.errors);
    }

    /// Point a validation error on one of `records` back at the line it was
    /// read from. `None` if `err.row` is not one of these records.
    #[must_use]
    pub fn locate(&self, err: &InvalidRuleError) -> Option<TextRuleError> {
        let &(metric, line) = self.lines.get(err.row)?;
        Some(TextRuleError {
            metric,
            line,
            message: err.violation.to_string(),
        })
    }
}

/// Read a block of rule lines written for one metric, e.g.
///
/// ```text
/// 1. Exclude line where column "Status" = "Cancelled"
/// 2. Filter column "Region" contain "EU", "US"
/// 3. Unfilter column "Priority"
/// ```
///
/// Each line becomes one or more rows addressed with `columns`, ready for
/// [`parse_records`](super::parse_records). Blank lines are skipped. A line
/// that does not follow the grammar is reported with its one-based line
/// number and does not stop the remaining lines.
#[must_use]
pub fn parse_rule_text(metric: Metric, text: &str, columns: &ColumnConfig) -> TextRules {
    let mut out = TextRules::default();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = i + 1;
        let parsed = rule_line
            .parse(line)
            .map_err(|e| e.to_string())
            .and_then(|rule| rule.into_records(metric, columns));
        match parsed {
            Ok(records) => {
                out.lines
                    .extend(std::iter::repeat((metric, line_no)).take(records.len()));
                out.records.extend(records);
            }
            Err(message) => {
                log::warn!("unreadable {metric} rule on line {line_no}: {message}");
                out.errors.push(TextRuleError {
                    metric,
                    line: line_no,
                    message,
                });
            }
        }
    }
    out
}

/// Read the two-column sheet layout: a label cell naming the metric and a
/// cell holding that metric's rule lines. Rows whose label names neither
/// metric are ignored.
pub fn records_from_metric_rows<I, L, T>(rows: I, columns: &ColumnConfig) -> TextRules
where
    I: IntoIterator<Item = (L, T)>,
    L: AsRef<str>,
    T: AsRef<str>,
{
    let mut out = TextRules::default();
    for (label, text) in rows {
        match Metric::from_label(label.as_ref()) {
            Some(metric) => out.append(parse_rule_text(metric, text.as_ref(), columns)),
            None => log::debug!("skipping sheet row labelled '{}'", label.as_ref().trim()),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Equals,
    Contains,
    Exists,
}

#[derive(Debug, Clone, PartialEq)]
struct TextRule {
    keyword: OperatorKind,
    column: String,
    /// Only `Unfilter` lines may omit it.
    comparator: Option<Comparator>,
    values: Vec<String>,
}

impl TextRule {
    fn into_records(self, metric: Metric, columns: &ColumnConfig) -> Result<Vec<RawRecord>, String> {
        let row = |operator: OperatorKind| {
            RawRecord::new()
                .set(&columns.metric_column, metric.as_str())
                .set(&columns.field_column, self.column.as_str())
                .set(&columns.operator_column, operator.as_str())
        };

        let records = match (self.keyword, self.comparator) {
            (OperatorKind::Unfilter, _) => vec![row(OperatorKind::Unfilter)],
            (OperatorKind::Exclude, Some(Comparator::Exists)) => {
                return Err("Exclude cannot be combined with exists".to_owned());
            }
            (_, Some(Comparator::Exists)) => vec![row(OperatorKind::Exists)],
            // Excluding any of several values is one Exclude per value.
            (OperatorKind::Exclude, _) => self
                .values
                .iter()
                .map(|v| row(OperatorKind::Exclude).set(&columns.value_column, v.as_str()))
                .collect(),
            (OperatorKind::Filter, Some(Comparator::Equals)) if self.values.len() == 1 => {
                vec![row(OperatorKind::Filter).set(&columns.value_column, self.values[0].as_str())]
            }
            _ => vec![row(OperatorKind::Contain).set(&columns.value_column, Cell::List(self.values.clone()))],
        };
        Ok(records)
    }
}

// -- Lexical ----------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace).void().parse_next(input)
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

/// Double-quoted text. Typographic quotes are accepted as delimiters.
fn quoted(input: &mut &str) -> ModalResult<String> {
    one_of(['"', '\u{201c}']).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' | '\u{201d}' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

// -- Rule line --------------------------------------------------------------

fn list_marker(input: &mut &str) -> ModalResult<()> {
    alt(((digit1, one_of(['.', ')'])).void(), one_of(['-', '*']).void())).parse_next(input)
}

fn operator_keyword(input: &mut &str) -> ModalResult<OperatorKind> {
    word.verify_map(|w: &str| match w.to_ascii_lowercase().as_str() {
        "unfilter" => Some(OperatorKind::Unfilter),
        "filter" | "include" => Some(OperatorKind::Filter),
        "exclude" => Some(OperatorKind::Exclude),
        "contain" | "contains" => Some(OperatorKind::Contain),
        _ => None,
    })
    .context(StrContext::Expected(StrContextValue::Description(
        "Filter, Exclude, Unfilter or Contain",
    )))
    .parse_next(input)
}

fn column_keyword(input: &mut &str) -> ModalResult<()> {
    (ws, word.verify(|w: &str| w.eq_ignore_ascii_case("column")))
        .void()
        .parse_next(input)
}

/// Any word between the operator and `column`, such as "line where".
fn filler(input: &mut &str) -> ModalResult<()> {
    (ws, take_till(1.., |c: char| c.is_whitespace() || c == '"' || c == '\u{201c}'))
        .void()
        .parse_next(input)
}

fn comparator(input: &mut &str) -> ModalResult<Comparator> {
    alt((
        "==".value(Comparator::Equals),
        "=".value(Comparator::Equals),
        word.verify_map(|w: &str| match w.to_ascii_lowercase().as_str() {
            "is" | "equals" => Some(Comparator::Equals),
            "contain" | "contains" | "in" => Some(Comparator::Contains),
            "exists" => Some(Comparator::Exists),
            _ => None,
        }),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "=, contain, in or exists",
    )))
    .parse_next(input)
}

fn value_separator(input: &mut &str) -> ModalResult<()> {
    (
        ws,
        alt((",".void(), word.verify(|w: &str| w.eq_ignore_ascii_case("or")).void())),
    )
        .void()
        .parse_next(input)
}

fn values(input: &mut &str) -> ModalResult<Vec<String>> {
    separated(1.., (ws, quoted).map(|(_, v)| v), value_separator)
        .context(StrContext::Expected(StrContextValue::Description(
            "quoted value",
        )))
        .parse_next(input)
}

fn rule_line(input: &mut &str) -> ModalResult<TextRule> {
    ws.parse_next(input)?;
    opt(list_marker).void().parse_next(input)?;
    ws.parse_next(input)?;
    let keyword = operator_keyword.parse_next(input)?;

    let _: ((), ()) = repeat_till(0.., filler, column_keyword)
        .context(StrContext::Expected(StrContextValue::StringLiteral("column")))
        .parse_next(input)?;

    ws.parse_next(input)?;
    let column = quoted
        .verify(|c: &String| !c.trim().is_empty())
        .context(StrContext::Expected(StrContextValue::Description(
            "quoted column name",
        )))
        .parse_next(input)?;

    ws.parse_next(input)?;
    let comparator = if keyword == OperatorKind::Unfilter {
        opt(comparator).parse_next(input)?
    } else {
        Some(comparator.parse_next(input)?)
    };
    let values = match comparator {
        Some(Comparator::Equals | Comparator::Contains) => values.parse_next(input)?,
        Some(Comparator::Exists) | None => Vec::new(),
    };

    ws.parse_next(input)?;
    opt('.').void().parse_next(input)?;
    ws.parse_next(input)?;

    Ok(TextRule {
        keyword,
        column: column.trim().to_owned(),
        comparator,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(input: &str) -> TextRule {
        rule_line.parse(input).unwrap()
    }

    #[test]
    fn exclude_line_from_workbook() {
        let rule = line(r#"1. Exclude line where column "A (ColA Name)" = "val1""#);
        assert_eq!(rule.keyword, OperatorKind::Exclude);
        assert_eq!(rule.column, "A (ColA Name)");
        assert_eq!(rule.comparator, Some(Comparator::Equals));
        assert_eq!(rule.values, vec!["val1".to_owned()]);
    }

    #[test]
    fn filter_contain_line() {
        let rule = line(r#"Filter column "B" contain "val2""#);
        assert_eq!(rule.keyword, OperatorKind::Filter);
        assert_eq!(rule.comparator, Some(Comparator::Contains));
        assert_eq!(rule.values, vec!["val2".to_owned()]);
    }

    #[test]
    fn unfilter_is_not_read_as_filter() {
        let rule = line(r#"Unfilter column "B" = "x""#);
        assert_eq!(rule.keyword, OperatorKind::Unfilter);
    }

    #[test]
    fn unfilter_without_comparator() {
        let rule = line(r#"3. Unfilter column "Priority""#);
        assert_eq!(rule.keyword, OperatorKind::Unfilter);
        assert_eq!(rule.comparator, None);
        assert!(rule.values.is_empty());
    }

    #[test]
    fn filter_without_comparator_is_an_error() {
        assert!(rule_line.parse(r#"Filter column "Priority""#).is_err());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let rule = line(r#"  3) EXCLUDE rows where COLUMN "Status" IS "Closed"."#);
        assert_eq!(rule.keyword, OperatorKind::Exclude);
        assert_eq!(rule.column, "Status");
        assert_eq!(rule.values, vec!["Closed".to_owned()]);
    }

    #[test]
    fn several_values() {
        let rule = line(r#"- Filter column "Region" in "EU", "US" or "AP""#);
        assert_eq!(rule.comparator, Some(Comparator::Contains));
        assert_eq!(rule.values, vec!["EU".to_owned(), "US".to_owned(), "AP".to_owned()]);
    }

    #[test]
    fn exists_takes_no_value() {
        let rule = line(r#"Filter column "Owner" exists"#);
        assert_eq!(rule.comparator, Some(Comparator::Exists));
        assert!(rule.values.is_empty());
    }

    #[test]
    fn typographic_quotes_and_escapes() {
        let rule = line("Filter column \u{201c}Name\u{201d} = \"say \\\"hi\\\"\"");
        assert_eq!(rule.column, "Name");
        assert_eq!(rule.values, vec!["say \"hi\"".to_owned()]);
    }

    #[test]
    fn missing_column_keyword_is_an_error() {
        assert!(rule_line.parse(r#"Filter "B" = "x""#).is_err());
    }

    #[test]
    fn unknown_operator_is_an_error() {
        assert!(rule_line.parse(r#"Match column "B" = "x""#).is_err());
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        assert!(rule_line.parse(r#"Filter column "B" = "x" please"#).is_err());
    }

    #[test]
    fn block_to_records() {
        let text = "1. Filter column \"type\" = \"A\"\n\n2. Exclude line where column \"type\" = \"B\"\n";
        let out = parse_rule_text(Metric::Numerator, text, &ColumnConfig::default());
        assert!(out.errors.is_empty());
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].get("Metric"), Some(&Cell::from("numerator")));
        assert_eq!(out.records[0].get("Operator"), Some(&Cell::from("Filter")));
        assert_eq!(out.records[1].get("Operator"), Some(&Cell::from("Exclude")));
        assert_eq!(out.records[1].get("Value"), Some(&Cell::from("B")));
    }

    #[test]
    fn multi_value_filter_becomes_contain() {
        let out = parse_rule_text(
            Metric::Denominator,
            r#"Filter column "tier" = "gold" or "silver""#,
            &ColumnConfig::default(),
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].get("Operator"), Some(&Cell::from("Contain")));
        assert_eq!(
            out.records[0].get("Value"),
            Some(&Cell::from(vec!["gold", "silver"]))
        );
    }

    #[test]
    fn multi_value_exclude_becomes_one_row_per_value() {
        let out = parse_rule_text(
            Metric::Numerator,
            r#"Exclude column "tier" in "gold", "silver""#,
            &ColumnConfig::default(),
        );
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[1].get("Value"), Some(&Cell::from("silver")));
    }

    #[test]
    fn records_remember_their_line() {
        let text = "1. Exclude column \"s\" in \"a\", \"b\"\n\n2. Filter column \"x\" = \"1\"";
        let out = parse_rule_text(Metric::Numerator, text, &ColumnConfig::default());
        assert_eq!(out.records.len(), 3);
        assert_eq!(
            out.lines,
            vec![
                (Metric::Numerator, 1),
                (Metric::Numerator, 1),
                (Metric::Numerator, 3)
            ]
        );
    }

    #[test]
    fn locate_maps_row_errors_to_lines() {
        let rows = vec![
            ("Numerator", "Filter column \"a\" = \"1\""),
            ("Denominator", "\nExclude column \"b\" = \"2\""),
        ];
        let out = records_from_metric_rows(rows, &ColumnConfig::default());
        let err = InvalidRuleError {
            row: 1,
            violation: crate::RuleViolation::EmptyField,
        };
        let located = out.locate(&err).unwrap();
        assert_eq!(located.metric, Metric::Denominator);
        assert_eq!(located.line, 2);
        assert_eq!(located.message, "field is empty");
        assert_eq!(out.locate(&InvalidRuleError { row: 2, ..err }), None);
    }

    #[test]
    fn exclude_exists_is_rejected() {
        let out = parse_rule_text(
            Metric::Numerator,
            r#"Exclude column "tier" exists"#,
            &ColumnConfig::default(),
        );
        assert!(out.records.is_empty());
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 1);
    }

    #[test]
    fn bad_line_does_not_stop_the_block() {
        let text = "Filter column \"a\" = \"1\"\nnonsense\nExclude column \"b\" = \"2\"";
        let out = parse_rule_text(Metric::Numerator, text, &ColumnConfig::default());
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 2);
        assert_eq!(out.errors[0].metric, Metric::Numerator);
    }

    #[test]
    fn sheet_rows_select_metric_by_label() {
        let rows = vec![
            ("Numerator", r#"Filter column "a" = "1""#),
            ("Notes", "anything at all"),
            ("denominator ", r#"Exclude column "b" = "2""#),
        ];
        let out = records_from_metric_rows(rows, &ColumnConfig::default());
        assert!(out.errors.is_empty());
        assert_eq!(out.records.len(), 2);
        assert_eq!(
            out.records[1].get("Metric"),
            Some(&Cell::from("denominator"))
        );
    }
}
