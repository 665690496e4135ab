//! Field metadata: column presentation, record-level file settings, header
//! groups and the typed accessors that move values in and out of a record.

use crate::mapping::style::HorizontalAlign;
use crate::mapping::style::IndexedColor;
use crate::mapping::style::VerticalAlign;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;

/// The closed set of field types a cell can be coerced into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetType {
    Text,
    Integer,
    Long,
    Double,
    Float,
    Date,
    Decimal,
}

/// A typed field value produced by coercion or read from a record.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Date(NaiveDateTime),
    Decimal(Decimal),
}

impl CellValue {
    pub fn target_type(&self) -> TargetType {
        match self {
            CellValue::Text(_) => TargetType::Text,
            CellValue::Integer(_) => TargetType::Integer,
            CellValue::Long(_) => TargetType::Long,
            CellValue::Double(_) => TargetType::Double,
            CellValue::Float(_) => TargetType::Float,
            CellValue::Date(_) => TargetType::Date,
            CellValue::Decimal(_) => TargetType::Decimal,
        }
    }

    /// Empty text carries no value and is never written into a record.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(text) if text.is_empty())
    }
}

/// Rust types that can back a mapped field.
pub trait FieldValue: Sized {
    /// Coercion target for fields of this type
    const TARGET_TYPE: TargetType;

    fn to_cell_value(&self) -> Option<CellValue>;

    fn from_cell_value(value: CellValue) -> Option<Self>;
}

macro_rules! impl_field_value {
    ($type:ty, $variant:ident) => {
        impl FieldValue for $type {
            const TARGET_TYPE: TargetType = TargetType::$variant;

            fn to_cell_value(&self) -> Option<CellValue> {
                Some(CellValue::$variant(self.clone()))
            }

            fn from_cell_value(value: CellValue) -> Option<Self> {
                match value {
                    CellValue::$variant(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

impl_field_value!(String, Text);
impl_field_value!(i32, Integer);
impl_field_value!(i64, Long);
impl_field_value!(f64, Double);
impl_field_value!(f32, Float);
impl_field_value!(NaiveDateTime, Date);
impl_field_value!(Decimal, Decimal);

impl<V: FieldValue> FieldValue for Option<V> {
    const TARGET_TYPE: TargetType = V::TARGET_TYPE;

    fn to_cell_value(&self) -> Option<CellValue> {
        self.as_ref().and_then(V::to_cell_value)
    }

    fn from_cell_value(value: CellValue) -> Option<Self> {
        V::from_cell_value(value).map(Some)
    }
}

/// Presentation and position of one mapped column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExcelColumn {
    /// 0-based column position
    pub index: usize,
    /// Header caption
    pub name: String,
    /// Column width in characters
    pub width: u16,
    pub font_color: IndexedColor,
    pub background_color: IndexedColor,
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    /// Number of columns the header cell spans
    pub col_span: usize,
    /// Number of rows the header cell spans
    pub row_span: usize,
}

impl Default for ExcelColumn {
    fn default() -> Self {
        ExcelColumn {
            index: 0,
            name: String::new(),
            width: 6,
            font_color: IndexedColor::White,
            background_color: IndexedColor::RoyalBlue,
            horizontal: HorizontalAlign::Center,
            vertical: VerticalAlign::Center,
            col_span: 1,
            row_span: 1,
        }
    }
}

impl ExcelColumn {
    pub fn new(index: usize, name: &str) -> Self {
        ExcelColumn {
            index,
            name: name.to_owned(),
            ..ExcelColumn::default()
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn font_color(mut self, color: IndexedColor) -> Self {
        self.font_color = color;
        self
    }

    pub fn background_color(mut self, color: IndexedColor) -> Self {
        self.background_color = color;
        self
    }

    pub fn horizontal(mut self, align: HorizontalAlign) -> Self {
        self.horizontal = align;
        self
    }

    pub fn vertical(mut self, align: VerticalAlign) -> Self {
        self.vertical = align;
        self
    }

    pub fn col_span(mut self, span: usize) -> Self {
        self.col_span = span;
        self
    }

    pub fn row_span(mut self, span: usize) -> Self {
        self.row_span = span;
        self
    }

    /// Whether the header cell covers more than itself.
    pub fn is_merged(&self) -> bool {
        self.col_span > 1 || self.row_span > 1
    }
}

/// Record-level settings: export naming and the header size for import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExcelFile {
    /// Stem of the exported file name
    pub file_name: String,
    pub sheet_name: String,
    /// Number of header rows, i.e. the 0-based index of the first data row
    pub header_index: usize,
}

impl Default for ExcelFile {
    fn default() -> Self {
        ExcelFile {
            file_name: String::new(),
            sheet_name: String::new(),
            header_index: 1,
        }
    }
}

impl ExcelFile {
    pub fn new(file_name: &str) -> Self {
        ExcelFile {
            file_name: file_name.to_owned(),
            ..ExcelFile::default()
        }
    }

    pub fn sheet_name(mut self, sheet_name: &str) -> Self {
        self.sheet_name = sheet_name.to_owned();
        self
    }

    pub fn header_index(mut self, header_index: usize) -> Self {
        self.header_index = header_index;
        self
    }

    /// File name offered for the import template, e.g. `users-template.xlsx`.
    pub fn template_file_name(&self) -> String {
        format!("{}-template.xlsx", self.file_name)
    }
}

/// A header group: a caption row whose child columns come from a nested record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExcelHeader {
    /// Header row position
    pub index: usize,
    /// Caption of the group
    pub value: String,
}

impl ExcelHeader {
    pub fn new(index: usize, value: &str) -> Self {
        ExcelHeader {
            index,
            value: value.to_owned(),
        }
    }
}

pub type ReadAccessor<T> = Arc<dyn Fn(&T) -> Option<CellValue> + Send + Sync>;
pub type WriteAccessor<T> = Arc<dyn Fn(&mut T, CellValue) + Send + Sync>;

/// How one field of `T` maps to one spreadsheet column.
pub struct FieldDescriptor<T> {
    pub(crate) field_name: &'static str,
    pub(crate) column: ExcelColumn,
    pub(crate) target_type: TargetType,
    pub(crate) reader: Option<ReadAccessor<T>>,
    pub(crate) writer: Option<WriteAccessor<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    pub fn column(&self) -> &ExcelColumn {
        &self.column
    }

    pub fn column_index(&self) -> usize {
        self.column.index
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn reader(&self) -> Option<&ReadAccessor<T>> {
        self.reader.as_ref()
    }

    pub fn writer(&self) -> Option<&WriteAccessor<T>> {
        self.writer.as_ref()
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        FieldDescriptor {
            field_name: self.field_name,
            column: self.column.clone(),
            target_type: self.target_type,
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl<T> Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("field_name", &self.field_name)
            .field("column", &self.column)
            .field("target_type", &self.target_type)
            .field("readable", &self.reader.is_some())
            .field("writable", &self.writer.is_some())
            .finish()
    }
}
