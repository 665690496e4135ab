//! # Sheet Mapper
//!
//! Declarative mapping between record types and spreadsheet rows.
//!
//! ## Features
//!
//! - **Explicit registration**: a record type describes its columns once through
//!   [`SheetRecord::describe`]; the schema is validated and cached per type
//! - **Import**: rows of an `.xlsx`/`.xlsm` sheet become records, with typed
//!   coercion of text, integers, floats, decimals and dates (1900 and 1904 epochs)
//! - **Error tolerance**: invalid cells either abort the import with their
//!   1-based position or are skipped field by field
//! - **Export layout**: header groups, data columns, merge ranges and cell
//!   styles ready to be rendered with `rust_xlsxwriter`
//! - **Pure Rust implementation**: `zip` and `quick-xml` for reading,
//!   `rust_xlsxwriter` for writing
//!
//! ## Example
//!
//! ```
//! use sheet_mapper::spreadsheet::cell::CellType;
//! use sheet_mapper::{ExcelColumn, ExcelDetail, SchemaBuilder, SheetRecord, Workbook};
//!
//! #[derive(Default)]
//! struct Book {
//!     title: String,
//!     pages: i32,
//! }
//!
//! impl SheetRecord for Book {
//!     fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
//!         builder
//!             .column("title", ExcelColumn::new(0, "Title"), |book| book.title.clone(), |book, title| book.title = title)
//!             .column("pages", ExcelColumn::new(1, "Pages"), |book| book.pages, |book, pages| book.pages = pages)
//!     }
//! }
//!
//! let mut workbook = Workbook::blank();
//! let sheet = workbook.add_sheet("Books");
//! sheet.set_cell(0, 0, CellType::Text, "Title");
//! sheet.set_cell(0, 1, CellType::Text, "Pages");
//! sheet.set_cell(1, 0, CellType::Text, "Dune");
//! sheet.set_cell(1, 1, CellType::Number, "412");
//!
//! let books = ExcelDetail::<Book>::from_workbook(workbook)?.records()?;
//! assert_eq!(books[0].pages, 412);
//! # Ok::<(), sheet_mapper::SheetMapperError>(())
//! ```
mod error;
mod helpers;

pub mod detail;
pub mod mapping;
pub mod spreadsheet;

pub use crate::detail::ExcelDetail;
pub use crate::error::SheetMapperError;
pub use crate::mapping::coerce::coerce;
pub use crate::mapping::coerce::CoercionError;
pub use crate::mapping::coerce::CoercionFailure;
pub use crate::mapping::coerce::DateEpoch;
pub use crate::mapping::column::CellValue;
pub use crate::mapping::column::ExcelColumn;
pub use crate::mapping::column::ExcelFile;
pub use crate::mapping::column::ExcelHeader;
pub use crate::mapping::column::FieldValue;
pub use crate::mapping::column::TargetType;
pub use crate::mapping::extract::extract_records;
pub use crate::mapping::extract::ImportOptions;
pub use crate::mapping::extract::RecordCursor;
pub use crate::mapping::schema::schema_of;
pub use crate::mapping::schema::RecordSchema;
pub use crate::mapping::schema::SchemaBuilder;
pub use crate::mapping::schema::SchemaError;
pub use crate::mapping::schema::SheetRecord;
pub use crate::mapping::structure::derive_structure;
pub use crate::mapping::structure::plan_region_borders;
pub use crate::mapping::structure::StructureInfo;
pub use crate::mapping::style::BorderSides;
pub use crate::mapping::style::BorderStyle;
pub use crate::mapping::style::CellStyle;
pub use crate::mapping::style::FillPattern;
pub use crate::mapping::style::HorizontalAlign;
pub use crate::mapping::style::IndexedColor;
pub use crate::mapping::style::VerticalAlign;
pub use crate::spreadsheet::SpreadsheetError;
pub use crate::spreadsheet::Workbook;
