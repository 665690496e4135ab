//! Row-by-row extraction of records from a sheet.

use crate::error::SheetMapperError;
use crate::mapping::coerce::coerce;
use crate::mapping::coerce::CoercionError;
use crate::mapping::coerce::DateEpoch;
use crate::mapping::schema::schema_of;
use crate::mapping::schema::RecordSchema;
use crate::mapping::schema::SheetRecord;
use crate::spreadsheet::cell::CellKind;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use log::debug;
use log::info;
use log::warn;
use std::sync::Arc;

/// Options of one import pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// 0-based index of the sheet to read.
    pub sheet_index: usize,

    /// Number of header rows to skip; the record's `header_index` when unset.
    pub header_offset: Option<usize>,

    /// Skip fields whose cell cannot be converted instead of failing.
    pub ignore_cell_errors: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            sheet_index: 0,
            header_offset: None,
            ignore_cell_errors: false,
        }
    }
}

impl ImportOptions {
    pub fn sheet_index(mut self, sheet_index: usize) -> Self {
        self.sheet_index = sheet_index;
        self
    }

    pub fn header_offset(mut self, header_offset: usize) -> Self {
        self.header_offset = Some(header_offset);
        self
    }

    pub fn ignore_cell_errors(mut self, ignore: bool) -> Self {
        self.ignore_cell_errors = ignore;
        self
    }
}

/// A single pass over the data rows of one sheet, yielding one record per
/// non-empty row in ascending row order.
///
/// The cursor stops for good after the first error.
pub struct RecordCursor<'w, T: SheetRecord> {
    sheet: &'w Sheet,
    schema: Arc<RecordSchema<T>>,
    epoch: DateEpoch,
    next_row: usize,
    last_row: Option<usize>,
    ignore_cell_errors: bool,
    failed: bool,
}

impl<'w, T: SheetRecord + Default> RecordCursor<'w, T> {
    /// Validates the configuration and positions the cursor on the first data row.
    ///
    /// # Errors
    ///
    /// * `MissingAccessor` when a mapped column has no write accessor
    /// * `InvalidConfiguration` when the header offset is 0
    /// * `SheetNotFound` when the workbook has no sheet at the index
    pub fn new(workbook: &'w Workbook, options: &ImportOptions) -> Result<Self, SheetMapperError> {
        let schema = schema_of::<T>()?;
        if let Some(field) = schema.fields().iter().find(|field| field.writer().is_none()) {
            return Err(schema.missing_accessor(field).into());
        }

        let header_offset = options.header_offset.unwrap_or_else(|| schema.header_offset());
        if header_offset < 1 {
            return Err(schema
                .invalid_configuration(format!("header offset must be at least 1, got {}", header_offset))
                .into());
        }

        let sheet = workbook
            .sheet_at(options.sheet_index)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(format!("#{}", options.sheet_index)))?;
        debug!(
            "Reading '{}' from sheet '{}', rows {}..={:?}",
            schema.record_name(),
            sheet.name(),
            header_offset,
            sheet.last_row_index()
        );

        Ok(RecordCursor {
            sheet,
            epoch: DateEpoch::from_1904(sheet.is_1904()),
            schema,
            next_row: header_offset,
            last_row: sheet.last_row_index(),
            ignore_cell_errors: options.ignore_cell_errors,
            failed: false,
        })
    }

    /// Index of the next row to be processed.
    pub fn position(&self) -> usize {
        self.next_row
    }

    /// Builds a record from one row; `None` when no mapped cell is present.
    fn read_row(&self, row: &Row) -> Result<Option<T>, SheetMapperError> {
        let mut record = T::default();
        let mut present = false;

        for field in self.schema.fields() {
            let cell = match row.cell_at(field.column_index()) {
                Some(cell) if cell.kind() != CellKind::Blank => cell,
                _ => continue,
            };
            present = true;

            let value = match coerce(cell, field.target_type(), self.epoch) {
                Ok(value) => value,
                Err(reason) if self.ignore_cell_errors => {
                    warn!("Skip field '{}' at {}: {}", field.field_name(), cell.reference(), reason);
                    continue;
                }
                Err(reason) => return Err(CoercionError::at(cell, reason).into()),
            };
            debug!("Cell {} of field '{}': {:?}", cell.reference(), field.field_name(), value);

            if let (Some(value), Some(writer)) = (value, field.writer()) {
                if !value.is_empty() {
                    writer(&mut record, value);
                }
            }
        }

        Ok(present.then_some(record))
    }
}

impl<'w, T: SheetRecord + Default> Iterator for RecordCursor<'w, T> {
    type Item = Result<T, SheetMapperError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let last_row = self.last_row?;

        let sheet = self.sheet;
        for row in sheet.rows_from(self.next_row) {
            let index = row.index();
            if index > last_row {
                break;
            }
            self.next_row = index + 1;

            match self.read_row(row) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => debug!("Row {} is empty", index + 1),
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
        self.next_row = self.next_row.max(last_row + 1);
        None
    }
}

/// Reads every data row of the selected sheet into records.
///
/// Either all records are returned or the first error; never a partial list.
pub fn extract_records<T: SheetRecord + Default>(
    workbook: &Workbook,
    options: &ImportOptions,
) -> Result<Vec<T>, SheetMapperError> {
    let records = RecordCursor::<T>::new(workbook, options)?.collect::<Result<Vec<_>, _>>()?;
    info!("Read {} records of '{}'", records.len(), std::any::type_name::<T>());
    Ok(records)
}
