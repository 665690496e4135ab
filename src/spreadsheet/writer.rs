//! Serializes the in-memory workbook model to `.xlsx` bytes.

use crate::error::SheetMapperError;
use crate::spreadsheet::cell::parse_datetime;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::Range;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use rust_xlsxwriter::Worksheet;

/// Serial day offset between the 1904 and the 1900 date systems
const EPOCH_1904_OFFSET: f64 = 1462f64;

/// Number formats used for date-typed cells
struct DateFormats {
    datetime: Format,
    date: Format,
    time: Format,
}

impl DateFormats {
    fn new() -> Self {
        DateFormats {
            datetime: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
            date: Format::new().set_num_format("yyyy-mm-dd"),
            time: Format::new().set_num_format("hh:mm:ss"),
        }
    }
}

/// Writes every sheet of the model into a new xlsx container.
///
/// Cells keep their storage type: numbers, booleans and dates are written as
/// native values, formulas are written as their cached result and errors as
/// their literal text. Rows without cells are not written. A workbook without
/// sheets gets one empty worksheet.
pub(crate) fn serialize(sheets: &[Sheet]) -> Result<Vec<u8>, SheetMapperError> {
    let formats = DateFormats::new();
    let mut workbook = XlsxWorkbook::new();
    if sheets.is_empty() {
        workbook.add_worksheet();
    }
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name())?;
        for row in sheet.rows() {
            for cell in row.cells() {
                write_cell(worksheet, cell, &formats)?;
            }
        }
        if let Some(range) = sheet.print_area() {
            let (first_row, first_col) = position(range.first_row, range.first_col)?;
            let (last_row, last_col) = position(range.last_row, range.last_col)?;
            worksheet.set_print_area(first_row, first_col, last_row, last_col)?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn write_cell(worksheet: &mut Worksheet, cell: &Cell, formats: &DateFormats) -> Result<(), SheetMapperError> {
    let (row, col) = position(cell.row(), cell.col())?;
    match cell.cell_type() {
        CellType::Empty => (),
        CellType::Boolean => {
            worksheet.write_boolean(row, col, cell.to_boolean())?;
        }
        CellType::Number => {
            worksheet.write_number(row, col, number(cell)?)?;
        }
        CellType::NumberDateTime1900 => {
            worksheet.write_number_with_format(row, col, number(cell)?, &formats.datetime)?;
        }
        CellType::NumberDate1900 => {
            worksheet.write_number_with_format(row, col, number(cell)?, &formats.date)?;
        }
        CellType::NumberTime1900 => {
            worksheet.write_number_with_format(row, col, number(cell)?, &formats.time)?;
        }
        CellType::NumberDateTime1904 => {
            worksheet.write_number_with_format(row, col, number(cell)? + EPOCH_1904_OFFSET, &formats.datetime)?;
        }
        CellType::NumberDate1904 => {
            worksheet.write_number_with_format(row, col, number(cell)? + EPOCH_1904_OFFSET, &formats.date)?;
        }
        CellType::NumberTime1904 => {
            worksheet.write_number_with_format(row, col, number(cell)?, &formats.time)?;
        }
        CellType::IsoDateTime => match parse_datetime(cell.value().trim()) {
            Some(datetime) => {
                worksheet.write_datetime_with_format(row, col, &datetime, &formats.datetime)?;
            }
            None => {
                worksheet.write_string(row, col, cell.value())?;
            }
        },
        CellType::Text | CellType::Formula | CellType::Error => {
            worksheet.write_string(row, col, cell.value())?;
        }
    }
    Ok(())
}

fn number(cell: &Cell) -> Result<f64, SheetMapperError> {
    cell.to_double()
        .map_err(|message| SheetMapperError::WithContextError(format!("{}: {}", cell.reference(), message)))
}

/// Converts 0-based indexes to the writer's row/column types.
fn position(row: usize, col: usize) -> Result<(u32, u16), SheetMapperError> {
    let out_of_bounds = || SpreadsheetError::CellOutOfBounds(Range::new(row, col, row, col).to_string());
    let row = u32::try_from(row).map_err(|_| out_of_bounds())?;
    let col = u16::try_from(col).map_err(|_| out_of_bounds())?;
    Ok((row, col))
}
