use tracing::warn;

use crate::error::StoreError;

/// Fixed column schema for a table. `headers` is the layout new tables are
/// created with; existing tables may carry extra trailing columns (e.g. the
/// rider-phone and assigned-at columns appended to booking tables).
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub name: &'static str,
    pub headers: &'static [&'static str],
}

/// An in-memory table of positional string cells, standing in for one legacy
/// spreadsheet sheet. All access is serialized by the owning service.
#[derive(Debug)]
pub struct Table {
    schema: Schema,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Opens (creates) a table with the schema's headers.
    pub fn open(schema: Schema) -> Self {
        let mut table = Self {
            schema,
            headers: Vec::new(),
            rows: Vec::new(),
        };
        table.normalize();
        table
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    /// Normalizes headers and row widths to the schema. Widens only, never
    /// shrinks, so trailing columns beyond the schema survive.
    pub fn normalize(&mut self) {
        let expected = self.schema.headers.len();
        if self.headers.len() < expected {
            self.headers.resize(expected, String::new());
        }
        let mut rewritten = false;
        for (i, header) in self.schema.headers.iter().enumerate() {
            if self.headers[i] != *header {
                self.headers[i] = (*header).to_string();
                rewritten = true;
            }
        }
        if rewritten {
            warn!(table = self.schema.name, "Rewrote non-conforming table headers");
        }
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }

    /// Appends a data row, padded to the current header width.
    pub fn append(&mut self, mut row: Vec<String>) {
        if row.len() > self.headers.len() {
            self.headers.resize(row.len(), String::new());
            self.normalize();
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// First row whose cell at `column` equals `value` (top-down linear scan).
    pub fn find(&self, column: usize, value: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(column).map(String::as_str) == Some(value))
    }

    /// Last row whose cell at `column` equals `value` (bottom-up linear scan).
    pub fn rfind(&self, column: usize, value: &str) -> Option<usize> {
        self.rows
            .iter()
            .rposition(|row| row.get(column).map(String::as_str) == Some(value))
    }

    /// Writes one cell, widening the row (and headers) if the column does not
    /// exist yet. Fails only when the row itself is absent.
    pub fn set_cell(
        &mut self,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> Result<(), StoreError> {
        if column >= self.headers.len() {
            self.headers.resize(column + 1, String::new());
            for r in &mut self.rows {
                r.resize(column + 1, String::new());
            }
        }
        let table = self.schema.name;
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(StoreError::RowOutOfRange {
                table: table.to_string(),
                row,
            })?;
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.into();
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<&str, StoreError> {
        let cells = self.rows.get(row).ok_or(StoreError::RowOutOfRange {
            table: self.schema.name.to_string(),
            row,
        })?;
        cells
            .get(column)
            .map(String::as_str)
            .ok_or(StoreError::SchemaTooNarrow {
                table: self.schema.name.to_string(),
                row,
                column,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: Schema = Schema {
        name: "TestTable",
        headers: &["A", "B", "C"],
    };

    #[test]
    fn open_normalizes_headers() {
        let table = Table::open(SCHEMA);
        assert!(table.is_empty());
        assert_eq!(table.name(), "TestTable");
    }

    #[test]
    fn append_pads_to_width_and_find_scans() {
        let mut table = Table::open(SCHEMA);
        table.append(vec!["1".into()]);
        table.append(vec!["2".into(), "x".into(), "y".into()]);
        table.append(vec!["2".into(), "later".into()]);

        assert_eq!(table.row(0).unwrap(), &["1", "", ""]);
        assert_eq!(table.find(0, "2"), Some(1));
        assert_eq!(table.rfind(0, "2"), Some(2));
        assert_eq!(table.find(0, "3"), None);
    }

    #[test]
    fn set_cell_widens_beyond_schema() {
        let mut table = Table::open(SCHEMA);
        table.append(vec!["1".into()]);
        table.set_cell(0, 5, "wide").unwrap();
        assert_eq!(table.cell(0, 5).unwrap(), "wide");
        // Earlier rows are widened too.
        table.append(vec!["2".into()]);
        assert_eq!(table.cell(1, 5).unwrap(), "");
    }

    #[test]
    fn set_cell_on_missing_row_is_an_error() {
        let mut table = Table::open(SCHEMA);
        let err = table.set_cell(7, 0, "x").unwrap_err();
        assert!(err.to_string().contains("no row 7"));
    }
}
