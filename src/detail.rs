//! An uploaded workbook bound to the record type it is imported as.

use crate::error::ResultMessage;
use crate::error::SheetMapperError;
use crate::mapping::extract::extract_records;
use crate::mapping::extract::ImportOptions;
use crate::mapping::extract::RecordCursor;
use crate::mapping::schema::schema_of;
use crate::mapping::schema::RecordSchema;
use crate::mapping::schema::SheetRecord;
use crate::spreadsheet::reference::Range;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use log::debug;
use log::warn;
use std::sync::Arc;

/// A workbook session for importing records of type `T`.
///
/// A detail may be detached (no workbook); print area operations are then
/// ignored and [`ExcelDetail::to_bytes`] yields nothing.
pub struct ExcelDetail<T: SheetRecord> {
    schema: Arc<RecordSchema<T>>,
    workbook: Option<Workbook>,
    file_name: String,
}

impl<T: SheetRecord + Default> ExcelDetail<T> {
    /// Opens an uploaded file.
    ///
    /// Unknown extensions produce an empty workbook, see [`Workbook::open_from_bytes`].
    pub fn open(file_name: &str, bytes: impl Into<Vec<u8>>) -> Result<Self, SheetMapperError> {
        let file_name = file_name.trim();
        let workbook = Workbook::open_from_bytes(file_name, bytes)?;
        let mut detail = Self::from_workbook(workbook)?;
        detail.file_name = file_name.to_owned();
        Ok(detail)
    }

    /// Binds an existing workbook.
    pub fn from_workbook(workbook: Workbook) -> Result<Self, SheetMapperError> {
        let schema = schema_of::<T>()?;
        Ok(ExcelDetail {
            file_name: schema.file().template_file_name(),
            workbook: Some(workbook),
            schema,
        })
    }

    /// A detail without a workbook, e.g. when no file was uploaded. Its file
    /// name is empty.
    pub fn detached() -> Result<Self, SheetMapperError> {
        let schema = schema_of::<T>()?;
        warn!("No workbook attached to '{}'", schema.record_name());
        Ok(ExcelDetail {
            file_name: String::new(),
            workbook: None,
            schema,
        })
    }

    /// Records of the first sheet; any invalid cell fails the import.
    pub fn records(&self) -> Result<Vec<T>, SheetMapperError> {
        self.records_with(0, false)
    }

    pub fn records_with(&self, sheet_index: usize, ignore_cell_errors: bool) -> Result<Vec<T>, SheetMapperError> {
        let options = ImportOptions::default()
            .sheet_index(sheet_index)
            .ignore_cell_errors(ignore_cell_errors);
        extract_records(self.attached_workbook(sheet_index)?, &options)
    }

    /// Starts a fresh lazy pass over the rows of a sheet.
    pub fn cursor(&self, options: &ImportOptions) -> Result<RecordCursor<'_, T>, SheetMapperError> {
        RecordCursor::new(self.attached_workbook(options.sheet_index)?, options)
    }
}

impl<T: SheetRecord> ExcelDetail<T> {
    /// Trimmed uploaded file name. A detail built from a workbook reports the
    /// template file name and a detached one reports `""`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn template_file_name(&self) -> String {
        self.schema.file().template_file_name()
    }

    pub fn sheet_name(&self) -> &str {
        &self.schema.file().sheet_name
    }

    pub fn schema(&self) -> &RecordSchema<T> {
        &self.schema
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    pub fn workbook_mut(&mut self) -> Option<&mut Workbook> {
        self.workbook.as_mut()
    }

    fn attached_workbook(&self, sheet_index: usize) -> Result<&Workbook, SheetMapperError> {
        self.workbook
            .as_ref()
            .ok_or_else(|| SpreadsheetError::SheetNotFound(format!("#{}", sheet_index)).into())
    }

    /// Sets the print area of a sheet. `x` positions are columns, `y` positions
    /// are rows, all 0-based and inclusive.
    pub fn set_print_area(
        &mut self,
        sheet_index: usize,
        start_x: usize,
        start_y: usize,
        end_x: usize,
        end_y: usize,
    ) -> Result<(), SheetMapperError> {
        match self.workbook.as_mut() {
            Some(workbook) => workbook.set_print_area(sheet_index, start_y, start_x, end_y, end_x),
            None => {
                debug!("Print area ignored, no workbook attached");
                Ok(())
            }
        }
    }

    /// Same as [`ExcelDetail::set_print_area`], with the sheet chosen by name.
    pub fn set_print_area_by_name(
        &mut self,
        sheet_name: &str,
        start_x: usize,
        start_y: usize,
        end_x: usize,
        end_y: usize,
    ) -> Result<(), SheetMapperError> {
        let Some(workbook) = self.workbook.as_ref() else {
            debug!("Print area ignored, no workbook attached");
            return Ok(());
        };
        let sheet_index = workbook.sheet_index(sheet_name).ok_or_else(|| {
            self.schema
                .invalid_configuration(format!("no sheet named '{}' for the print area", sheet_name))
        })?;
        self.set_print_area(sheet_index, start_x, start_y, end_x, end_y)
    }

    /// Sets the print area of a named sheet from an A1-style range such as `"A1:D10"`.
    pub fn set_print_area_range(&mut self, sheet_name: &str, range: &str) -> Result<(), SheetMapperError> {
        let range = Range::try_from(range)?;
        self.set_print_area_by_name(sheet_name, range.first_col, range.first_row, range.last_col, range.last_row)
    }

    /// Serializes the attached workbook to `.xlsx` bytes; `None` when detached.
    pub fn to_bytes(&self) -> Result<Option<Vec<u8>>, SheetMapperError> {
        match &self.workbook {
            Some(workbook) => workbook
                .serialize_to_bytes()
                .with_prefix(&format!("Failed to serialize '{}'", self.file_name))
                .map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::column::ExcelColumn;
    use crate::mapping::column::ExcelFile;
    use crate::mapping::schema::SchemaBuilder;
    use crate::mapping::schema::SchemaError;
    use crate::spreadsheet::cell::CellType;

    #[derive(Debug, Default, PartialEq)]
    struct Order {
        number: i64,
        customer: String,
    }

    impl SheetRecord for Order {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder
                .file(ExcelFile::new("orders").sheet_name("Orders"))
                .column("number", ExcelColumn::new(0, "Number"), |order| order.number, |order, number| order.number = number)
                .column("customer", ExcelColumn::new(1, "Customer"), |order| order.customer.clone(), |order, customer| order.customer = customer)
        }
    }

    fn orders() -> Workbook {
        let mut workbook = Workbook::blank();
        let sheet = workbook.add_sheet("Orders");
        sheet.set_cell(0, 0, CellType::Text, "Number");
        sheet.set_cell(0, 1, CellType::Text, "Customer");
        sheet.set_cell(1, 0, CellType::Number, "1001");
        sheet.set_cell(1, 1, CellType::Text, "Ada");
        sheet.set_cell(2, 0, CellType::Number, "1002");
        sheet.set_cell(2, 1, CellType::Text, "Grace");
        workbook
    }

    #[test]
    fn records_are_repeatable() -> Result<(), SheetMapperError> {
        let detail = ExcelDetail::<Order>::from_workbook(orders())?;
        let first = detail.records()?;
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].customer, "Grace");
        assert_eq!(detail.records()?, first);

        let mut cursor = detail.cursor(&ImportOptions::default().header_offset(2))?;
        assert_eq!(cursor.next().transpose()?.map(|order| order.number), Some(1002));
        assert!(cursor.next().is_none());
        Ok(())
    }

    #[test]
    fn names() -> Result<(), SheetMapperError> {
        let detached = ExcelDetail::<Order>::detached()?;
        assert_eq!(detached.file_name(), "");
        assert_eq!(detached.template_file_name(), "orders-template.xlsx");
        assert_eq!(ExcelDetail::<Order>::from_workbook(orders())?.file_name(), "orders-template.xlsx");
        assert_eq!(detached.sheet_name(), "Orders");

        let bytes = orders().serialize_to_bytes()?;
        let uploaded = ExcelDetail::<Order>::open("  orders-2024.xlsx ", bytes)?;
        assert_eq!(uploaded.file_name(), "orders-2024.xlsx");
        assert_eq!(uploaded.template_file_name(), "orders-template.xlsx");
        assert_eq!(uploaded.records()?.len(), 2);
        Ok(())
    }

    #[test]
    fn detached_is_inert() -> Result<(), SheetMapperError> {
        let mut detail = ExcelDetail::<Order>::detached()?;
        detail.set_print_area(0, 0, 0, 3, 3)?;
        detail.set_print_area_by_name("Missing", 0, 0, 3, 3)?;
        detail.set_print_area_range("Missing", "A1:D4")?;
        assert!(detail.to_bytes()?.is_none());
        assert!(detail.workbook().is_none());
        assert!(matches!(
            detail.records(),
            Err(SheetMapperError::SpreadsheetError(SpreadsheetError::SheetNotFound(_)))
        ));
        Ok(())
    }

    #[test]
    fn print_areas() -> Result<(), SheetMapperError> {
        let mut detail = ExcelDetail::<Order>::from_workbook(orders())?;
        detail.set_print_area_by_name("Orders", 0, 0, 1, 2)?;
        let area = |detail: &ExcelDetail<Order>| detail.workbook().and_then(|workbook| workbook.sheet_at(0)).and_then(|sheet| sheet.print_area());
        assert_eq!(area(&detail), Some(Range::new(0, 0, 2, 1)));

        detail.set_print_area_range("Orders", "A1:D10")?;
        assert_eq!(area(&detail), Some(Range::new(0, 0, 9, 3)));

        assert!(matches!(
            detail.set_print_area_by_name("Missing", 0, 0, 1, 1),
            Err(SheetMapperError::SchemaError(SchemaError::InvalidConfiguration { .. }))
        ));
        assert!(matches!(detail.set_print_area_range("Orders", "not a range"), Err(SheetMapperError::RangeError(_))));
        assert!(detail.set_print_area(4, 0, 0, 1, 1).is_err());

        let bytes = detail.to_bytes()?.expect("attached workbook");
        assert_eq!(Workbook::open_from_bytes("orders.xlsx", bytes)?.sheet_names(), vec!["Orders"]);
        Ok(())
    }
}
