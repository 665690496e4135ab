//! # Spreadsheet Module
//!
//! An in-memory workbook model with an `.xlsx`/`.xlsm` reader and an `.xlsx`
//! serializer. The record mapping engine only needs sheet/row/cell access,
//! so the model keeps every cell as its storage type plus raw text.
pub mod cell;
mod excel;
pub mod reference;
pub mod sheet;
mod writer;
mod xlsx;

use crate::error::SheetMapperError;
use crate::spreadsheet::reference::Range;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use log::debug;
use log::warn;
use std::path::Path;
use thiserror::Error;

/// Errors raised while opening, navigating or serializing a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// The file name carries no extension this crate can decode
    #[error("Cannot detect file format for '{name}'")]
    UnsupportedFormat { name: String },

    /// The extension promises a format the content does not match
    #[error("Content of '{name}' does not match its extension: {message}")]
    ContentMismatch { name: String, message: String },

    /// Requested sheet does not exist
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// A required part of the container is missing or broken
    #[error("Missing or invalid part '{0}'")]
    FileError(String),

    /// A cell position exceeds the limits of the xlsx format
    #[error("Cell position '{0}' is out of bounds")]
    CellOutOfBounds(String),
}

/// Container formats recognised from a file name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Office Open XML workbook (`.xlsx`, `.xlsm`)
    Xlsx,
}

impl WorkbookFormat {
    /// Detects the container format from the file name extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SpreadsheetError::UnsupportedFormat`] for any other extension,
    /// including the legacy binary `.xls` and `.xlsb` formats.
    pub fn sniff(file_name: &str) -> Result<Self, SpreadsheetError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase());
        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(Self::Xlsx),
            _ => Err(SpreadsheetError::UnsupportedFormat {
                name: file_name.to_owned(),
            }),
        }
    }
}

/// An owned workbook: an ordered list of sheets.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Creates a workbook without any sheet.
    pub fn blank() -> Self {
        Workbook::default()
    }

    /// Decodes a workbook from the bytes of an uploaded file.
    ///
    /// The format is chosen from the file name extension.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Original file name, only its extension matters
    /// * `bytes` - Full content of the file
    ///
    /// # Returns
    ///
    /// The decoded workbook, or a blank workbook when the extension is not
    /// recognised (a warning is logged).
    ///
    /// # Errors
    ///
    /// Returns [`SpreadsheetError::ContentMismatch`] when the extension is
    /// recognised but the content cannot be decoded as that format.
    pub fn open_from_bytes(file_name: &str, bytes: impl Into<Vec<u8>>) -> Result<Self, SheetMapperError> {
        match WorkbookFormat::sniff(file_name) {
            Ok(WorkbookFormat::Xlsx) => {
                let sheets = XlsxSpreadsheet::open(bytes.into())
                    .and_then(|mut spreadsheet| spreadsheet.read_sheets())
                    .map_err(|error| match error {
                        SheetMapperError::SpreadsheetError(error @ SpreadsheetError::CellOutOfBounds(_)) => error,
                        error => SpreadsheetError::ContentMismatch {
                            name: file_name.to_owned(),
                            message: error.to_string(),
                        },
                    })?;
                debug!("Opened '{}' with {} sheets", file_name, sheets.len());
                Ok(Workbook { sheets })
            }
            Err(error) => {
                warn!("{}, falling back to a blank workbook", error);
                Ok(Workbook::blank())
            }
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Returns the sheet at the 0-based index.
    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Returns the index of the sheet with exactly this name.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|sheet| sheet.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name()).collect()
    }

    /// Appends a sheet, or returns the existing sheet with the same name.
    pub fn add_sheet(&mut self, name: &str) -> &mut Sheet {
        let index = match self.sheet_index(name) {
            Some(index) => index,
            None => {
                self.sheets.push(Sheet::new(name, false));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }

    /// Sets the print area of a sheet; all positions are 0-based and inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadsheetError::SheetNotFound`] when no sheet has the index.
    pub fn set_print_area(
        &mut self,
        sheet_index: usize,
        first_row: usize,
        first_col: usize,
        last_row: usize,
        last_col: usize,
    ) -> Result<(), SheetMapperError> {
        let sheet = self
            .sheets
            .get_mut(sheet_index)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(format!("#{sheet_index}")))?;
        let range = Range::new(first_row, first_col, last_row, last_col);
        debug!("Print area of sheet '{}' set to {}", sheet.name(), range);
        sheet.set_print_area(range);
        Ok(())
    }

    /// Serializes the workbook to `.xlsx` bytes.
    ///
    /// The output is not a lossless copy of the model:
    ///
    /// * formula cells are written as their cached value in a text cell, so they
    ///   read back as [`CellKind::Text`](cell::CellKind::Text) without a formula
    /// * error cells are written as their literal, such as `#N/A`, in a text cell
    /// * rows without any cell, e.g. from [`Sheet::touch_row`], are dropped and
    ///   the last row index of the reopened sheet may shrink
    pub fn serialize_to_bytes(&self) -> Result<Vec<u8>, SheetMapperError> {
        writer::serialize(&self.sheets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellKind;
    use crate::spreadsheet::cell::CellType;

    #[test]
    fn sniff_extensions() {
        assert_eq!(WorkbookFormat::sniff("report.xlsx").ok(), Some(WorkbookFormat::Xlsx));
        assert_eq!(WorkbookFormat::sniff("REPORT.XLSM").ok(), Some(WorkbookFormat::Xlsx));
        assert!(matches!(
            WorkbookFormat::sniff("report.xls"),
            Err(SpreadsheetError::UnsupportedFormat { .. })
        ));
        assert!(WorkbookFormat::sniff("report").is_err());
        assert!(WorkbookFormat::sniff("report.csv").is_err());
    }

    #[test]
    fn unknown_extension_opens_blank() -> Result<(), SheetMapperError> {
        let workbook = Workbook::open_from_bytes("notes.txt", b"hello".to_vec())?;
        assert_eq!(workbook.sheet_count(), 0);
        assert!(workbook.sheet_at(0).is_none());
        Ok(())
    }

    #[test]
    fn mismatched_content_fails() {
        let result = Workbook::open_from_bytes("data.xlsx", b"not a zip".to_vec());
        assert!(matches!(
            result,
            Err(SheetMapperError::SpreadsheetError(SpreadsheetError::ContentMismatch { .. }))
        ));
    }

    #[test]
    fn print_area_requires_sheet() -> Result<(), SheetMapperError> {
        let mut workbook = Workbook::blank();
        assert!(workbook.set_print_area(0, 0, 0, 1, 1).is_err());

        workbook.add_sheet("Data");
        workbook.set_print_area(0, 9, 3, 0, 0)?;
        assert_eq!(
            workbook.sheet_at(0).and_then(|sheet| sheet.print_area()),
            Some(Range::new(0, 0, 9, 3))
        );
        Ok(())
    }

    #[test]
    fn round_trip_bytes() -> Result<(), SheetMapperError> {
        let mut workbook = Workbook::blank();
        let sheet = workbook.add_sheet("People");
        sheet.set_cell(0, 0, CellType::Text, "name");
        sheet.set_cell(0, 1, CellType::Text, "age");
        sheet.set_cell(1, 0, CellType::Text, "Ada");
        sheet.set_cell(1, 1, CellType::Number, "36");
        sheet.set_cell(2, 0, CellType::Boolean, "1");
        sheet.set_cell(2, 1, CellType::NumberDate1900, "45292");
        sheet.set_cell(3, 0, CellType::Formula, "cached");
        workbook.set_print_area(0, 0, 0, 3, 1)?;
        assert_eq!(workbook.add_sheet("People").name(), "People");
        assert_eq!(workbook.sheet_count(), 1);

        let bytes = workbook.serialize_to_bytes()?;
        let reopened = Workbook::open_from_bytes("people.xlsx", bytes)?;
        assert_eq!(reopened.sheet_names(), vec!["People"]);

        let sheet = reopened.sheet_at(0).expect("sheet");
        assert_eq!(sheet.last_row_index(), Some(3));
        let cell = |row: usize, col: usize| sheet.row_at(row).and_then(|row| row.cell_at(col)).cloned();
        assert_eq!(cell(1, 0).map(|cell| cell.value().to_owned()).as_deref(), Some("Ada"));
        assert_eq!(cell(1, 1).map(|cell| (cell.kind(), cell.value().to_owned())), Some((CellKind::Numeric, "36".to_owned())));
        assert_eq!(cell(2, 0).map(|cell| cell.to_boolean()), Some(true));
        assert_eq!(cell(2, 1).map(|cell| cell.cell_type().is_date_formatted()), Some(true));
        assert_eq!(cell(2, 1).and_then(|cell| cell.to_text().ok()).as_deref(), Some("2024-01-01"));
        assert_eq!(cell(3, 0).map(|cell| cell.kind()), Some(CellKind::Text));
        Ok(())
    }

    #[test]
    fn serialization_drops_formulas_and_bare_rows() -> Result<(), SheetMapperError> {
        let mut workbook = Workbook::blank();
        let sheet = workbook.add_sheet("Totals");
        sheet.set_cell(0, 0, CellType::Formula, "42");
        sheet.set_cell(1, 0, CellType::Error, "#N/A");
        sheet.touch_row(6);
        assert_eq!(sheet.last_row_index(), Some(6));

        let reopened = Workbook::open_from_bytes("totals.xlsx", workbook.serialize_to_bytes()?)?;
        let sheet = reopened.sheet_at(0).expect("sheet");
        assert_eq!(sheet.last_row_index(), Some(1));
        assert!(sheet.row_at(6).is_none());

        let formula = sheet.row_at(0).and_then(|row| row.cell_at(0)).expect("formula cell");
        assert_eq!((formula.cell_type(), formula.value()), (CellType::Text, "42"));
        let error = sheet.row_at(1).and_then(|row| row.cell_at(0)).expect("error cell");
        assert_eq!((error.kind(), error.value()), (CellKind::Text, "#N/A"));
        Ok(())
    }
}
