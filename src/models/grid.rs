use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cell::normalize;

/// One exportable field: its display name and its position in the source row.
///
/// Names are not unique, so rows are always addressed by `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub position: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// Columns in the given order, positioned 0..n.
    pub fn from_names<I, S>(names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(position, name)| Self::new(name, position))
            .collect()
    }
}

/// Read-only access to one record's cells.
pub trait Row {
    /// The raw host value, `None` when the record has no value for the column.
    fn cell_value_raw(&self, column: &Column) -> Option<&Value>;

    /// Host-formatted text for the cell, when the host provides one.
    fn cell_value_as_string(&self, _column: &Column) -> Option<String> {
        None
    }

    fn normalized_cell(&self, column: &Column) -> String {
        self.cell_value_as_string(column)
            .unwrap_or_else(|| normalize(self.cell_value_raw(column)))
    }
}

impl<T: Row + ?Sized> Row for &T {
    fn cell_value_raw(&self, column: &Column) -> Option<&Value> {
        (**self).cell_value_raw(column)
    }

    fn cell_value_as_string(&self, column: &Column) -> Option<String> {
        (**self).cell_value_as_string(column)
    }
}

impl Row for [Value] {
    fn cell_value_raw(&self, column: &Column) -> Option<&Value> {
        self.get(column.position)
    }
}

impl Row for Vec<Value> {
    fn cell_value_raw(&self, column: &Column) -> Option<&Value> {
        self.get(column.position)
    }
}

/// Header plus normalized rows, shared by every serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportGrid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportGrid {
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header followed by every row.
    pub fn lines(&self) -> impl Iterator<Item = &[String]> {
        std::iter::once(self.header.as_slice()).chain(self.rows.iter().map(Vec::as_slice))
    }

    /// Widest cell of each column in characters, header included.
    pub fn column_char_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }
}

/// Builds the grid in column order, one output row per input record.
pub fn build_grid<I, R>(columns: &[Column], rows: I) -> ExportGrid
where
    I: IntoIterator<Item = R>,
    R: Row,
{
    let header = columns.iter().map(|c| c.name.clone()).collect();
    let rows = rows
        .into_iter()
        .map(|row| columns.iter().map(|c| row.normalized_cell(c)).collect())
        .collect();

    ExportGrid { header, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FormattedRow {
        values: Vec<Value>,
        display: Vec<Option<String>>,
    }

    impl Row for FormattedRow {
        fn cell_value_raw(&self, column: &Column) -> Option<&Value> {
            self.values.get(column.position)
        }

        fn cell_value_as_string(&self, column: &Column) -> Option<String> {
            self.display.get(column.position).cloned().flatten()
        }
    }

    #[test]
    fn test_header_keeps_column_order() {
        let columns = Column::from_names(["Zeta", "Alpha", "Alpha"]);
        let grid = build_grid(&columns, Vec::<Vec<Value>>::new());

        assert_eq!(grid.header, vec!["Zeta", "Alpha", "Alpha"]);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_rows_addressed_by_position() {
        // Duplicate names, reordered columns
        let columns = vec![Column::new("Name", 1), Column::new("Name", 0)];
        let rows = vec![vec![json!("first"), json!("second")]];

        let grid = build_grid(&columns, &rows);
        assert_eq!(grid.rows, vec![vec!["second", "first"]]);
    }

    #[test]
    fn test_short_rows_pad_with_empty_cells() {
        let columns = Column::from_names(["A", "B", "C"]);
        let rows = vec![vec![json!(1)], vec![]];

        let grid = build_grid(&columns, &rows);
        assert_eq!(grid.record_count(), 2);
        assert!(grid.rows.iter().all(|r| r.len() == grid.column_count()));
        assert_eq!(grid.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_host_formatting_wins() {
        let columns = Column::from_names(["Amount", "Due"]);
        let row = FormattedRow {
            values: vec![json!(1234.5), json!("2024-01-05T00:00:00.000Z")],
            display: vec![Some("$1,234.50".to_string()), None],
        };

        let grid = build_grid(&columns, [row]);
        assert_eq!(grid.rows[0], vec!["$1,234.50", "2024-01-05T00:00:00.000Z"]);
    }

    #[test]
    fn test_column_char_widths() {
        let grid = ExportGrid {
            header: vec!["Id".into(), "Description".into()],
            rows: vec![vec!["12345".into(), "ok".into()], vec!["ü".into(), "".into()]],
        };
        assert_eq!(grid.column_char_widths(), vec![5, 11]);
    }
}
