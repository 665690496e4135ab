//! A1-style cell references and ranges.

use crate::error::SheetMapperError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static RANGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Z]+)\$?(\d+)(:\$?([A-Z]+)\$?(\d+))?$").expect("Hardcode regex pattern"));

/// Number of rows an xlsx worksheet can hold
pub const MAX_ROWS: usize = 1_048_576;

/// Number of columns an xlsx worksheet can hold
pub const MAX_COLS: usize = 16_384;

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// Converts a column name ("A", "AB") to a 0-based index.
pub(crate) fn col_to_index(col: &str) -> Option<usize> {
    if col.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for character in col.chars() {
        if !character.is_ascii_alphabetic() {
            return None;
        }
        let digit = (character.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Converts a 1-based row label ("1", "42") to a 0-based index.
pub(crate) fn row_to_index(row: &str) -> Option<usize> {
    row.parse::<usize>().ok().and_then(|row| row.checked_sub(1))
}

/// Converts a 0-based column index to its column name.
pub(crate) fn index_to_col(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Converts 0-based indexes to an Excel-style reference such as "B3".
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Parses an Excel-style reference such as "B3" into 0-based `(row, col)`.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let (col, row) = reference.split_at(split);
    Some((row_to_index(row)?, col_to_index(col)?))
}

/// A rectangular block of cells, 0-based and inclusive on both ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Range {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl Range {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Range {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    /// Whether the range covers more than a single cell.
    pub fn is_merged(&self) -> bool {
        self.first_row != self.last_row || self.first_col != self.last_col
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }
}

impl TryFrom<&str> for Range {
    type Error = SheetMapperError;

    /// Parses "A1" or "B2:C5" (absolute markers allowed, case-insensitive).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_uppercase();
        let captures = RANGE_PATTERN
            .captures(value.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let index = |group: usize, convert: fn(&str) -> Option<usize>| {
            captures
                .get(group)
                .map(|matcher| matcher.as_str())
                .and_then(convert)
        };
        let first_col = index(1, col_to_index).ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let first_row = index(2, row_to_index).ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let last_col = index(4, col_to_index).unwrap_or(first_col);
        let last_row = index(5, row_to_index).unwrap_or(first_row);
        Ok(Range::new(first_row, first_col, last_row, last_col))
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let first = index_to_reference(self.first_row, self.first_col);
        if self.is_merged() {
            write!(f, "{}:{}", first, index_to_reference(self.last_row, self.last_col))
        } else {
            write!(f, "{}", first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_references() {
        assert_eq!(index_to_reference(0, 0), "A1");
        assert_eq!(index_to_reference(2, 1), "B3");
        assert_eq!(index_to_reference(9, 26), "AA10");
        assert_eq!(index_to_reference(0, 701), "ZZ1");
        assert_eq!(index_to_reference(0, 702), "AAA1");
        assert_eq!(reference_to_index("AA10"), Some((9, 26)));
        assert_eq!(reference_to_index("b3"), Some((2, 1)));
        assert_eq!(reference_to_index("A0"), None);
        assert_eq!(reference_to_index("12"), None);
    }

    #[test]
    fn parse_ranges() -> Result<(), SheetMapperError> {
        assert_eq!(Range::try_from("A1:D10")?, Range::new(0, 0, 9, 3));
        assert_eq!(Range::try_from("$b$2")?, Range::new(1, 1, 1, 1));
        assert_eq!(Range::try_from("D10:A1")?, Range::new(0, 0, 9, 3));
        assert_eq!(Range::try_from("A1:D10")?.to_string(), "A1:D10");
        assert!(Range::try_from("1:10").is_err());
        assert!(Range::try_from("A0").is_err());
        Ok(())
    }
}
