use serde::{Deserialize, Serialize};

/// A raw spreadsheet cell as handed over by a workbook reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl Cell {
    /// `true` for text that is empty after trimming and for empty lists.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            Cell::List(items) => items.iter().all(|s| s.trim().is_empty()),
            Cell::Bool(_) | Cell::Number(_) => false,
        }
    }

    /// Text content, trimmed. `None` for non-text cells.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.trim()),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_owned())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<i64> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<Vec<String>> for Cell {
    fn from(v: Vec<String>) -> Self {
        Cell::List(v)
    }
}

impl From<Vec<&str>> for Cell {
    fn from(v: Vec<&str>) -> Self {
        Cell::List(v.into_iter().map(str::to_owned).collect())
    }
}

/// One rule row: column name to raw cell.
///
/// Column lookups ignore case and surrounding whitespace, so `"Field"`,
/// `"field"` and `" FIELD "` address the same cell. Setting a column twice
/// replaces the earlier cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    cells: Vec<(String, Cell)>,
}

impl RawRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell.
    #[must_use]
    pub fn set(mut self, column: &str, cell: impl Into<Cell>) -> Self {
        self.insert(column, cell.into());
        self
    }

    /// Set a cell (mutable reference version).
    pub fn insert(&mut self, column: &str, cell: Cell) {
        match self.position(column) {
            Some(i) => self.cells[i].1 = cell,
            None => self.cells.push((column.to_owned(), cell)),
        }
    }

    /// Look up a cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.position(column).map(|i| &self.cells[i].1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        let wanted = column.trim();
        self.cells
            .iter()
            .position(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
    }
}

impl<K: AsRef<str>, C: Into<Cell>> FromIterator<(K, C)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (column, cell) in iter {
            record.insert(column.as_ref(), cell.into());
        }
        record
    }
}
