//! Conversion of raw cells into typed field values.

use crate::mapping::column::CellValue;
use crate::mapping::column::TargetType;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellKind;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// A cell whose value cannot be converted into the field type.
/// Row and column are 1-based, as shown by spreadsheet applications.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid cell value at row {row}, column {column} ({reference}): {reason}")]
pub struct CoercionError {
    pub row: usize,
    pub column: usize,
    pub reference: String,
    pub reason: CoercionFailure,
}

impl CoercionError {
    pub(crate) fn at(cell: &Cell, reason: CoercionFailure) -> Self {
        CoercionError {
            row: cell.row() + 1,
            column: cell.col() + 1,
            reference: cell.reference(),
            reason,
        }
    }
}

/// Date system used to read numeric serial dates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DateEpoch {
    /// Serial 1 is 1900-01-01 (with the Lotus 1-2-3 leap year bug)
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01
    Excel1904,
}

impl DateEpoch {
    pub fn from_1904(is_1904: bool) -> Self {
        if is_1904 {
            Self::Excel1904
        } else {
            Self::Excel1900
        }
    }

    fn is_1904(&self) -> bool {
        *self == Self::Excel1904
    }
}

/// Reason a single cell could not be converted, e.g. `parse 'abc' to double failed`.
///
/// It names no position; [`CoercionError`] adds the cell coordinates.
pub type CoercionFailure = String;

/// Converts one cell into a value of the target type.
///
/// Blank cells produce `Ok(None)`. Every other cell is first rendered to its
/// intermediate text (see [`Cell::to_text`]) and then parsed:
/// integers go through `f64` and are truncated, decimals accept plain and
/// scientific notation, and dates accept serial numbers as well as ISO text.
/// Failures are a [`CoercionFailure`] reason; the caller wraps it into a
/// [`CoercionError`] at the cell position.
pub fn coerce(cell: &Cell, target: TargetType, epoch: DateEpoch) -> Result<Option<CellValue>, CoercionFailure> {
    let kind = cell.kind();
    if kind == CellKind::Blank {
        return Ok(None);
    }

    let value = match target {
        TargetType::Date => match kind {
            CellKind::Numeric | CellKind::Text | CellKind::Formula => CellValue::Date(cell.to_datetime(epoch.is_1904())?),
            _ => return Err(format!("cannot convert {:?} cell '{}' to date", kind, cell.value())),
        },
        TargetType::Text => CellValue::Text(cell.to_text()?),
        TargetType::Integer => CellValue::Integer(parse_double(&cell.to_text()?)? as i32),
        TargetType::Long => CellValue::Long(parse_double(&cell.to_text()?)? as i64),
        TargetType::Double => CellValue::Double(parse_double(&cell.to_text()?)?),
        TargetType::Float => CellValue::Float(parse_float(&cell.to_text()?)?),
        TargetType::Decimal => CellValue::Decimal(parse_decimal(&cell.to_text()?)?),
    };
    Ok(Some(value))
}

fn parse_double(text: &str) -> Result<f64, CoercionFailure> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| format!("parse '{}' to double failed", text))
}

fn parse_float(text: &str) -> Result<f32, CoercionFailure> {
    text.trim()
        .parse::<f32>()
        .map_err(|_| format!("parse '{}' to float failed", text))
}

fn parse_decimal(text: &str) -> Result<Decimal, CoercionFailure> {
    let value = text.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| format!("parse '{}' to decimal failed", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;
    use crate::spreadsheet::sheet::Sheet;
    use chrono::NaiveDate;

    fn cell(cell_type: CellType, value: &str) -> Cell {
        let mut sheet = Sheet::new("Test", false);
        sheet.set_cell(4, 2, cell_type, value).clone()
    }

    fn coerce_1900(cell_type: CellType, value: &str, target: TargetType) -> Result<Option<CellValue>, CoercionFailure> {
        coerce(&cell(cell_type, value), target, DateEpoch::Excel1900)
    }

    #[test]
    fn numbers_to_integers() {
        assert_eq!(coerce_1900(CellType::Number, "1234.0", TargetType::Integer), Ok(Some(CellValue::Integer(1234))));
        assert_eq!(coerce_1900(CellType::Number, "1234", TargetType::Long), Ok(Some(CellValue::Long(1234))));
        assert_eq!(coerce_1900(CellType::Number, "-7.9", TargetType::Integer), Ok(Some(CellValue::Integer(-7))));
        assert_eq!(coerce_1900(CellType::Text, " 42 ", TargetType::Integer), Ok(Some(CellValue::Integer(42))));
        assert_eq!(coerce_1900(CellType::Number, "3.5", TargetType::Double), Ok(Some(CellValue::Double(3.5))));
        assert_eq!(coerce_1900(CellType::Number, "0.25", TargetType::Float), Ok(Some(CellValue::Float(0.25))));
    }

    #[test]
    fn numbers_to_text() {
        assert_eq!(coerce_1900(CellType::Number, "3.50", TargetType::Text), Ok(Some(CellValue::Text("3.5".to_owned()))));
        assert_eq!(coerce_1900(CellType::Number, "1234", TargetType::Text), Ok(Some(CellValue::Text("1234".to_owned()))));
        assert_eq!(coerce_1900(CellType::Boolean, "1", TargetType::Text), Ok(Some(CellValue::Text("true".to_owned()))));
        assert_eq!(coerce_1900(CellType::Error, "#N/A", TargetType::Text), Ok(Some(CellValue::Text("#N/A".to_owned()))));
        assert_eq!(coerce_1900(CellType::Formula, "total", TargetType::Text), Ok(Some(CellValue::Text("total".to_owned()))));
        assert_eq!(
            coerce_1900(CellType::NumberDate1900, "45292", TargetType::Text),
            Ok(Some(CellValue::Text("2024-01-01".to_owned())))
        );
    }

    #[test]
    fn decimals() {
        let decimal = |value: &str| Decimal::from_str(value).expect("decimal literal");
        assert_eq!(coerce_1900(CellType::Number, "12.50", TargetType::Decimal), Ok(Some(CellValue::Decimal(decimal("12.5")))));
        assert_eq!(coerce_1900(CellType::Text, "1.5e3", TargetType::Decimal), Ok(Some(CellValue::Decimal(decimal("1500")))));
        assert!(coerce_1900(CellType::Text, "twelve", TargetType::Decimal).is_err());
    }

    #[test]
    fn dates() {
        let date = |year, month, day| NaiveDate::from_ymd_opt(year, month, day).and_then(|date| date.and_hms_opt(0, 0, 0)).map(CellValue::Date);
        assert_eq!(coerce_1900(CellType::Number, "45292", TargetType::Date), Ok(date(2024, 1, 1)));
        assert_eq!(coerce_1900(CellType::NumberDate1900, "45292", TargetType::Date), Ok(date(2024, 1, 1)));
        assert_eq!(coerce_1900(CellType::Text, "2024-01-01", TargetType::Date), Ok(date(2024, 1, 1)));
        assert_eq!(coerce(&cell(CellType::Number, "43830"), TargetType::Date, DateEpoch::Excel1904), Ok(date(2024, 1, 1)));
        assert!(coerce_1900(CellType::Boolean, "1", TargetType::Date).is_err());
        assert!(coerce_1900(CellType::Text, "soon", TargetType::Date).is_err());
    }

    #[test]
    fn blanks_and_failures() {
        assert_eq!(coerce_1900(CellType::Empty, "", TargetType::Integer), Ok(None));
        assert_eq!(coerce_1900(CellType::Text, "", TargetType::Text), Ok(Some(CellValue::Text(String::new()))));
        assert!(coerce_1900(CellType::Text, "", TargetType::Integer).is_err());
        assert!(coerce_1900(CellType::Text, "abc", TargetType::Integer).is_err());
        assert!(coerce_1900(CellType::Boolean, "1", TargetType::Double).is_err());
        assert!(coerce_1900(CellType::Error, "#DIV/0!", TargetType::Long).is_err());
    }

    #[test]
    fn failure_reasons() {
        assert_eq!(
            coerce_1900(CellType::Text, "abc", TargetType::Integer),
            Err("parse 'abc' to double failed".to_owned())
        );
        assert_eq!(
            coerce_1900(CellType::Text, "1.2.3", TargetType::Decimal),
            Err("parse '1.2.3' to decimal failed".to_owned())
        );
        let reason: CoercionFailure = match coerce_1900(CellType::Boolean, "1", TargetType::Date) {
            Err(reason) => reason,
            Ok(value) => panic!("expected a failure, got {:?}", value),
        };
        assert!(reason.starts_with("cannot convert"));
    }

    #[test]
    fn error_position_is_one_based() {
        let error = CoercionError::at(&cell(CellType::Text, "abc"), "parse failed".to_owned());
        assert_eq!((error.row, error.column), (5, 3));
        assert_eq!(error.reference, "C5");
        assert_eq!(error.to_string(), "Invalid cell value at row 5, column 3 (C5): parse failed");
    }
}
