use crate::config::ColumnConfig;
use crate::{Cell, InvalidRuleError, Metric, Operator, OperatorKind, RawRecord, Rule, RuleSet, RuleViolation, Value};

/// Result of validating a batch of rule rows.
///
/// Every input row is accounted for: it either became a rule in `rules` or
/// an entry in `errors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub rules: RuleSet,
    /// Rejected rows in input order.
    pub errors: Vec<InvalidRuleError>,
}

impl ParseOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate raw rule rows into a [`RuleSet`].
///
/// A malformed row does not stop validation; its error is recorded with the
/// row's zero-based index and parsing moves on to the next row.
pub fn parse_records<'a, I>(records: I, columns: &ColumnConfig) -> ParseOutcome
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut outcome = ParseOutcome::default();
    for (row, record) in records.into_iter().enumerate() {
        match parse_record(record, columns) {
            Ok(rule) => outcome.rules.push(rule),
            Err(violation) => {
                log::warn!("rejected rule row {row}: {violation}");
                outcome.errors.push(InvalidRuleError { row, violation });
            }
        }
    }
    log::debug!(
        "parsed {} rules, rejected {} rows",
        outcome.rules.len(),
        outcome.errors.len()
    );
    outcome
}

/// Validate a single row.
///
/// # Errors
///
/// Returns the first [`RuleViolation`] found, checking metric, field,
/// operator and value in that order.
pub fn parse_record(record: &RawRecord, columns: &ColumnConfig) -> Result<Rule, RuleViolation> {
    let metric_cell = required(record, &columns.metric_column)?;
    let metric_label = cell_label(metric_cell);
    let metric = Metric::from_label(&metric_label)
        .ok_or(RuleViolation::UnknownMetric { found: metric_label })?;

    let field = cell_label(required(record, &columns.field_column)?);
    if field.is_empty() {
        return Err(RuleViolation::EmptyField);
    }

    let operator_label = cell_label(required(record, &columns.operator_column)?);
    let kind = OperatorKind::from_label(&operator_label).ok_or(RuleViolation::UnknownOperator {
        found: operator_label,
    })?;

    let value = record.get(&columns.value_column);
    let operator = match kind {
        OperatorKind::Filter => Operator::Filter(single_value(kind, value)?),
        OperatorKind::Exclude => Operator::Exclude(single_value(kind, value)?),
        OperatorKind::Contain => Operator::Contain(value_list(kind, value)?),
        OperatorKind::Unfilter => Operator::Unfilter,
        OperatorKind::Exists => Operator::Exists,
    };

    Ok(Rule::new(metric, field, operator))
}

fn required<'r>(record: &'r RawRecord, column: &str) -> Result<&'r Cell, RuleViolation> {
    record.get(column).ok_or_else(|| RuleViolation::MissingColumn {
        column: column.to_owned(),
    })
}

/// Text used for labels (metric, field, operator): trimmed, with numbers and
/// booleans rendered as they would appear in the sheet.
fn cell_label(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.trim().to_owned(),
        Cell::Number(n) => Value::from_number(*n).to_string(),
        Cell::Bool(b) => b.to_string(),
        Cell::List(items) => items.join(",").trim().to_owned(),
    }
}

fn single_value(kind: OperatorKind, cell: Option<&Cell>) -> Result<Value, RuleViolation> {
    let cell = match cell {
        Some(cell) if !cell.is_blank() => cell,
        _ => return Err(RuleViolation::MissingValue { operator: kind }),
    };
    match cell {
        Cell::Text(s) => Ok(Value::String(s.trim().to_owned())),
        Cell::Number(n) => Ok(Value::from_number(*n)),
        Cell::Bool(b) => Ok(Value::Bool(*b)),
        Cell::List(_) => {
            let mut items = list_items(cell);
            match items.len() {
                1 => Ok(items.remove(0)),
                count => Err(RuleViolation::UnexpectedList {
                    operator: kind,
                    count,
                }),
            }
        }
    }
}

fn value_list(kind: OperatorKind, cell: Option<&Cell>) -> Result<Vec<Value>, RuleViolation> {
    let cell = cell.ok_or(RuleViolation::MissingValue { operator: kind })?;
    let values = list_items(cell);
    if values.is_empty() {
        return Err(RuleViolation::EmptyValueList { operator: kind });
    }
    Ok(values)
}

/// Items of a list-shaped cell. Text cells are split on commas; blank items
/// are dropped.
fn list_items(cell: &Cell) -> Vec<Value> {
    match cell {
        Cell::Text(s) => non_blank(s.split(',')),
        Cell::List(items) => non_blank(items.iter().map(String::as_str)),
        Cell::Number(n) => vec![Value::from_number(*n)],
        Cell::Bool(b) => vec![Value::Bool(*b)],
    }
}

fn non_blank<'s>(items: impl Iterator<Item = &'s str>) -> Vec<Value> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Value::from)
        .collect()
}
