use crate::spreadsheet::reference::index_to_reference;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;

/// Storage types of cell data, as decoded from the container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CellType {
    /// Cell exists but holds no value
    #[default]
    Empty,
    /// Boolean values ("1"/"0" or "true"/"false")
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Plain or shared string values
    Text,
    /// Formula cells; the value is the cached result
    Formula,
    /// Error literals such as `#DIV/0!`
    Error,
}

/// The coarse kind of a cell as seen by record extraction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellKind {
    Numeric,
    Text,
    Formula,
    Boolean,
    Error,
    Blank,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            Self::Empty => CellKind::Blank,
            Self::Boolean => CellKind::Boolean,
            Self::Text => CellKind::Text,
            Self::Formula => CellKind::Formula,
            Self::Error => CellKind::Error,
            _ => CellKind::Numeric,
        }
    }

    /// Whether a numeric value carries a date or time number format.
    pub fn is_date_formatted(&self) -> bool {
        !matches!(
            self,
            Self::Empty | Self::Boolean | Self::Number | Self::Text | Self::Formula | Self::Error
        )
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// Represents a single cell in a spreadsheet with position, type, and value.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) cell_type: CellType,
    /// Cell value as string
    pub(crate) value: String,
}

impl Cell {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn kind(&self) -> CellKind {
        self.cell_type.kind()
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts cell value to boolean ("1" or "true" = true).
    pub fn to_boolean(&self) -> bool {
        self.value == "1" || self.value.eq_ignore_ascii_case("true")
    }

    /// Converts cell value to double-precision floating point.
    pub fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    /// Renders the cell the way it reads in a spreadsheet application.
    ///
    /// Date-formatted numbers become `YYYY-MM-DD[ HH:MM:SS]`, plain numbers keep
    /// their stored text (normalized through `f64` when fractional or written
    /// with an exponent), booleans
    /// become `true`/`false` and every other kind yields its raw value.
    pub fn to_text(&self) -> Result<String, String> {
        let text = match self.cell_type {
            CellType::Boolean => if self.to_boolean() { "true" } else { "false" }.to_owned(),
            CellType::Number => {
                let value = self.value.trim();
                if value.contains(['.', 'e', 'E']) {
                    self.to_double()?.to_string()
                } else {
                    value.to_owned()
                }
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                format_datetime(&self.to_datetime(self.cell_type.is_1904())?)
            }
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                self.to_datetime(self.cell_type.is_1904())?.format("%Y-%m-%d").to_string()
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                self.to_datetime(self.cell_type.is_1904())?.format("%H:%M:%S").to_string()
            }
            CellType::IsoDateTime => self.value.replace('T', " "),
            _ => self.value.to_owned(),
        };
        Ok(text)
    }

    /// Converts cell value to a calendar date-time.
    ///
    /// Numeric cells are serial day numbers; `is_1904` selects the epoch for plain
    /// numbers, while date-formatted numbers carry their own epoch. Text cells are
    /// parsed as ISO dates or date-times.
    pub fn to_datetime(&self, is_1904: bool) -> Result<NaiveDateTime, String> {
        match self.cell_type {
            CellType::Number => serial_to_datetime(self.to_double()?, is_1904),
            kind if kind.is_date_formatted() && kind != CellType::IsoDateTime => {
                serial_to_datetime(self.to_double()?, kind.is_1904())
            }
            CellType::IsoDateTime | CellType::Text | CellType::Formula => parse_datetime(self.value.trim()),
            _ => None,
        }
        .ok_or_else(|| format!("parse '{}' to datetime failed", self.value))
    }
}

/// Converts an Excel serial day number to a date-time.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0f64 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days + offset)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(milliseconds)?)
}

/// Parses `2024-01-31 12:30:00[.fff]`, `2024-01-31T12:30:00[.fff]` or `2024-01-31`.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn format_datetime(datetime: &NaiveDateTime) -> String {
    if datetime.and_utc().timestamp_subsec_millis() > 0 {
        datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
