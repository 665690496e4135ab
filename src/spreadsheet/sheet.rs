use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::Range;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A physical row of a sheet. Rows may exist without any cells.
#[derive(Clone, Debug, Default)]
pub struct Row {
    index: usize,
    cells: BTreeMap<usize, Cell>,
}

impl Row {
    /// Row index (0-based)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the cell at the 0-based column, if one was stored.
    pub fn cell_at(&self, col: usize) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Cells in ascending column order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Represents a sheet of a workbook with its rows kept sparse and ordered.
#[derive(Clone, Debug)]
pub struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// Rows keyed by their 0-based index
    rows: BTreeMap<usize, Row>,
    /// Whether numeric dates count from 1904-01-01
    pub(crate) is_1904: bool,
    /// Region to print, if any
    print_area: Option<Range>,
}

impl Sheet {
    pub(crate) fn new(name: &str, is_1904: bool) -> Self {
        Sheet {
            name: name.to_owned(),
            rows: BTreeMap::new(),
            is_1904,
            print_area: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// Index of the last physical row, `None` for a sheet without rows.
    pub fn last_row_index(&self) -> Option<usize> {
        self.rows.keys().next_back().copied()
    }

    /// Returns the row at the 0-based index, `None` when the row is absent.
    pub fn row_at(&self, index: usize) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Rows in ascending order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Rows with an index of at least `first`, in ascending order
    pub fn rows_from(&self, first: usize) -> impl Iterator<Item = &Row> {
        self.rows.range(first..).map(|(_, row)| row)
    }

    /// Makes sure a row exists at the index, even if it never receives a cell.
    pub fn touch_row(&mut self, index: usize) -> &mut Row {
        self.rows.entry(index).or_insert_with(|| Row {
            index,
            cells: BTreeMap::new(),
        })
    }

    /// Stores a cell, replacing any previous one at the same position.
    pub fn set_cell(&mut self, row: usize, col: usize, cell_type: CellType, value: impl Into<String>) -> &mut Cell {
        let cell = Cell {
            row,
            col,
            cell_type,
            value: value.into(),
        };
        match self.touch_row(row).cells.entry(col) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                *slot = cell;
                slot
            }
            Entry::Vacant(entry) => entry.insert(cell),
        }
    }

    pub fn print_area(&self) -> Option<Range> {
        self.print_area
    }

    pub(crate) fn set_print_area(&mut self, range: Range) {
        self.print_area = Some(range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_rows() {
        let mut sheet = Sheet::new("Data", false);
        assert_eq!(sheet.last_row_index(), None);

        sheet.set_cell(0, 0, CellType::Text, "name");
        sheet.set_cell(3, 2, CellType::Number, "42");
        sheet.touch_row(5);

        assert_eq!(sheet.last_row_index(), Some(5));
        assert!(sheet.row_at(1).is_none());
        assert!(sheet.row_at(5).map(Row::is_empty).unwrap_or(false));

        let row = sheet.row_at(3).expect("row 3");
        assert_eq!(row.index(), 3);
        assert!(row.cell_at(0).is_none());
        assert_eq!(row.cell_at(2).map(Cell::value), Some("42"));
        assert_eq!(row.cell_at(2).map(Cell::reference).as_deref(), Some("C4"));
    }

    #[test]
    fn replace_cell() {
        let mut sheet = Sheet::new("Data", false);
        sheet.set_cell(1, 1, CellType::Text, "old");
        sheet.set_cell(1, 1, CellType::Boolean, "1").value = "0".to_owned();

        let cells: Vec<&Cell> = sheet.row_at(1).map(|row| row.cells().collect()).unwrap_or_default();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].cell_type(), CellType::Boolean);
        assert_eq!(cells[0].value(), "0");
    }
}
