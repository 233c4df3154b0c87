//! Tabular report of requested properties.
//!
//! Rows are property labels (optionally preceded by a `Label` row), columns
//! are load cases, plus an optional collapsed `Full` column.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the optional first row holding per-case labels
pub const LABEL_ROW: &str = "Label";

/// A single report cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Not requested for this column
    #[default]
    Empty,
    Value(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            Cell::Value(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Value(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// Column identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKey {
    /// Collapsed column combining every load case
    Full,
    /// Load case number (1-based)
    LoadCase(usize),
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Full => f.write_str("Full"),
            ColumnKey::LoadCase(n) => write!(f, "{n}"),
        }
    }
}

/// Dense row-major table of report cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    rows: Vec<String>,
    columns: Vec<ColumnKey>,
    cells: Vec<Vec<Cell>>,
}

impl ReportTable {
    /// Create a table with every cell empty
    pub fn new(rows: Vec<String>, columns: Vec<ColumnKey>) -> Self {
        let cells = vec![vec![Cell::Empty; columns.len()]; rows.len()];
        Self {
            rows,
            columns,
            cells,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn row_index(&self, row: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    pub fn column_index(&self, column: ColumnKey) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn has_label_row(&self) -> bool {
        self.rows.first().is_some_and(|r| r == LABEL_ROW)
    }

    /// Cell at `(row, column)`, or `None` when either is absent
    pub fn get(&self, row: &str, column: ColumnKey) -> Option<&Cell> {
        let r = self.row_index(row)?;
        let c = self.column_index(column)?;
        Some(&self.cells[r][c])
    }

    /// Set a cell; returns false when the row or column is absent
    pub fn set(&mut self, row: &str, column: ColumnKey, cell: Cell) -> bool {
        match (self.row_index(row), self.column_index(column)) {
            (Some(r), Some(c)) => {
                self.cells[r][c] = cell;
                true
            }
            _ => false,
        }
    }

    /// Cells of one row, in column order
    pub fn row_cells(&self, index: usize) -> &[Cell] {
        &self.cells[index]
    }

    /// Insert a whole column at `position`; `cells` is padded or truncated to
    /// the row count
    pub fn insert_column(&mut self, position: usize, key: ColumnKey, mut cells: Vec<Cell>) {
        let position = position.min(self.columns.len());
        cells.resize(self.rows.len(), Cell::Empty);
        self.columns.insert(position, key);
        for (row, cell) in self.cells.iter_mut().zip(cells) {
            row.insert(position, cell);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        let body: Vec<Vec<String>> = self
            .cells
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let label_width = self.rows.iter().map(String::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..self.columns.len())
            .map(|c| {
                body.iter()
                    .map(|row| row[c].len())
                    .chain(std::iter::once(header[c].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:label_width$}", "")?;
        for (name, width) in header.iter().zip(&widths) {
            write!(f, "  {name:>width$}")?;
        }
        writeln!(f)?;
        for (label, row) in self.rows.iter().zip(&body) {
            write!(f, "{label:<label_width$}")?;
            for (text, width) in row.iter().zip(&widths) {
                write!(f, "  {text:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReportTable {
        let mut table = ReportTable::new(
            vec!["E11".to_string(), "E22".to_string()],
            vec![ColumnKey::LoadCase(1), ColumnKey::LoadCase(2)],
        );
        table.set("E11", ColumnKey::LoadCase(1), Cell::Value(100.0));
        table.set("E22", ColumnKey::LoadCase(2), Cell::Value(200.5));
        table
    }

    #[test]
    fn set_and_get_cells() {
        let table = sample();
        assert_eq!(table.get("E11", ColumnKey::LoadCase(1)), Some(&Cell::Value(100.0)));
        assert_eq!(table.get("E11", ColumnKey::LoadCase(2)), Some(&Cell::Empty));
        assert_eq!(table.get("G12", ColumnKey::LoadCase(1)), None);
        assert!(!table.has_label_row());
    }

    #[test]
    fn set_rejects_missing_row() {
        let mut table = sample();
        assert!(!table.set("v12", ColumnKey::LoadCase(1), Cell::Value(0.3)));
    }

    #[test]
    fn inserts_column_at_front() {
        let mut table = sample();
        table.insert_column(0, ColumnKey::Full, vec![Cell::Value(1.0), Cell::Value(2.0)]);
        assert_eq!(table.columns()[0], ColumnKey::Full);
        assert_eq!(table.row_cells(1)[0], Cell::Value(2.0));
        assert_eq!(table.row_cells(1)[2], Cell::Value(200.5));
    }

    #[test]
    fn display_aligns_columns() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("2"));
        assert!(lines[1].starts_with("E11"));
        assert!(lines[2].contains("200.5"));
        let widths: Vec<usize> = lines.iter().map(|l| l.len()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }
}
