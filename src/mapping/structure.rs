//! Layout derived from a record schema: header groups, data columns and the
//! cell styles used to render them.

use crate::error::SheetMapperError;
use crate::mapping::column::ExcelColumn;
use crate::mapping::column::ReadAccessor;
use crate::mapping::schema::schema_of;
use crate::mapping::schema::SheetRecord;
use crate::mapping::style::BorderSides;
use crate::mapping::style::BorderStyle;
use crate::mapping::style::CellStyle;
use crate::mapping::style::FillPattern;
use crate::mapping::style::IndexedColor;
use crate::spreadsheet::reference::Range;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fmt::Formatter;

/// One child column of a header group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderColumn {
    pub column: ExcelColumn,
    pub header_cell_style: CellStyle,
}

/// A caption row spanning the columns of a nested record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderField {
    pub index: usize,
    pub caption: String,
    pub column_fields: Vec<HeaderColumn>,
}

/// A data column with its styles and the accessor that reads the exported value.
pub struct DataField<T> {
    pub field_name: &'static str,
    pub column: ExcelColumn,
    pub header_cell_style: CellStyle,
    pub data_cell_style: CellStyle,
    pub reader: ReadAccessor<T>,
}

impl<T> Clone for DataField<T> {
    fn clone(&self) -> Self {
        DataField {
            field_name: self.field_name,
            column: self.column.clone(),
            header_cell_style: self.header_cell_style.clone(),
            data_cell_style: self.data_cell_style.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<T> Debug for DataField<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataField")
            .field("field_name", &self.field_name)
            .field("column", &self.column)
            .field("header_cell_style", &self.header_cell_style)
            .field("data_cell_style", &self.data_cell_style)
            .finish()
    }
}

/// Everything needed to lay out an export of `T`.
#[derive(Clone, Debug)]
pub struct StructureInfo<T> {
    pub header_fields: Vec<HeaderField>,
    pub data_fields: Vec<DataField<T>>,
}

impl<T> StructureInfo<T> {
    /// Regions to merge for header group columns spanning more than one cell.
    pub fn header_merge_ranges(&self) -> Vec<Range> {
        self.header_fields
            .iter()
            .flat_map(|header| {
                header
                    .column_fields
                    .iter()
                    .filter(|field| field.column.is_merged())
                    .map(move |field| {
                        let column = &field.column;
                        Range::new(
                            header.index,
                            column.index,
                            header.index + column.row_span - 1,
                            column.index + column.col_span - 1,
                        )
                    })
            })
            .collect()
    }
}

/// Borders, solid fill and wrapped text shared by every header cell.
fn header_template() -> CellStyle {
    CellStyle::bordered().with_(CellStyle {
        fill_pattern: Some(FillPattern::Solid),
        wrap_text: Some(true),
        ..CellStyle::default()
    })
}

fn header_cell_style(column: &ExcelColumn) -> CellStyle {
    header_template().with_(CellStyle {
        horizontal: Some(column.horizontal),
        vertical: Some(column.vertical),
        fill_color: Some(column.background_color),
        fill_pattern: Some(FillPattern::Solid),
        ..CellStyle::default()
    })
}

fn data_cell_style(column: &ExcelColumn) -> CellStyle {
    CellStyle::bordered().with_(CellStyle {
        horizontal: Some(column.horizontal),
        vertical: Some(column.vertical),
        fill_color: Some(IndexedColor::White),
        fill_pattern: Some(FillPattern::Solid),
        wrap_text: Some(true),
        ..CellStyle::default()
    })
}

/// Derives the export layout of `T` from its registered schema.
///
/// Header groups and data fields are both ordered by index; fields sharing an
/// index keep their registration order.
///
/// # Errors
///
/// Fails when the schema is invalid, or with
/// [`SchemaError::MissingAccessor`](crate::mapping::schema::SchemaError::MissingAccessor)
/// when a data column cannot be read.
pub fn derive_structure<T: SheetRecord>() -> Result<StructureInfo<T>, SheetMapperError> {
    let schema = schema_of::<T>()?;

    let mut header_fields = Vec::with_capacity(schema.headers().len());
    for header in schema.headers() {
        let mut columns = header.columns()?;
        columns.sort_by_key(|column| column.index);
        header_fields.push(HeaderField {
            index: header.header().index,
            caption: header.header().value.clone(),
            column_fields: columns
                .into_iter()
                .map(|column| HeaderColumn {
                    header_cell_style: header_cell_style(&column),
                    column,
                })
                .collect(),
        });
    }
    header_fields.sort_by_key(|header| header.index);

    let mut data_fields = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let reader = field.reader().ok_or_else(|| schema.missing_accessor(field))?;
        data_fields.push(DataField {
            field_name: field.field_name(),
            column: field.column().clone(),
            header_cell_style: header_cell_style(field.column()),
            data_cell_style: data_cell_style(field.column()),
            reader: reader.clone(),
        });
    }
    data_fields.sort_by_key(|field| field.column.index);

    debug!(
        "Derived structure of '{}': {} header groups, {} data fields",
        schema.record_name(),
        header_fields.len(),
        data_fields.len()
    );
    Ok(StructureInfo {
        header_fields,
        data_fields,
    })
}

/// Plans the borders outlining a merged region.
///
/// Returns one entry per edge cell as `((row, col), sides)`: the left side on
/// the first column, the right side on the last column, the top on the first
/// row and the bottom on the last row. Corner cells carry two sides.
pub fn plan_region_borders(range: &Range, style: BorderStyle) -> Vec<((usize, usize), BorderSides)> {
    let mut plan: BTreeMap<(usize, usize), BorderSides> = BTreeMap::new();
    let mut mark = |row: usize, col: usize, sides: BorderSides| {
        plan.entry((row, col))
            .and_modify(|current| *current = current.merge(&sides))
            .or_insert(sides);
    };

    for row in range.first_row..=range.last_row {
        mark(row, range.first_col, BorderSides { left: Some(style), ..BorderSides::default() });
        mark(row, range.last_col, BorderSides { right: Some(style), ..BorderSides::default() });
    }
    for col in range.first_col..=range.last_col {
        mark(range.first_row, col, BorderSides { top: Some(style), ..BorderSides::default() });
        mark(range.last_row, col, BorderSides { bottom: Some(style), ..BorderSides::default() });
    }

    plan.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::column::CellValue;
    use crate::mapping::column::ExcelHeader;
    use crate::mapping::schema::SchemaBuilder;
    use crate::mapping::style::HorizontalAlign;

    #[derive(Default)]
    struct Contact {
        phone: String,
        email: String,
    }

    impl SheetRecord for Contact {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder
                .column("email", ExcelColumn::new(3, "Email").col_span(2), |c| c.email.clone(), |c, v| c.email = v)
                .column("phone", ExcelColumn::new(2, "Phone"), |c| c.phone.clone(), |c, v| c.phone = v)
        }
    }

    #[derive(Default)]
    struct Employee {
        name: String,
        salary: f64,
    }

    impl SheetRecord for Employee {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder
                .header::<Contact>("contact", ExcelHeader::new(0, "Contact"))
                .column(
                    "salary",
                    ExcelColumn::new(1, "Salary").horizontal(HorizontalAlign::Right).background_color(IndexedColor::Gold),
                    |e| e.salary,
                    |e, v| e.salary = v,
                )
                .column("name", ExcelColumn::new(0, "Name"), |e| e.name.clone(), |e, v| e.name = v)
        }
    }

    struct WriteOnly;

    impl SheetRecord for WriteOnly {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder.write_column("value", ExcelColumn::new(0, "Value"), |_: &mut WriteOnly, _: i32| {})
        }
    }

    #[test]
    fn derive_sorted_fields() -> Result<(), SheetMapperError> {
        let structure = derive_structure::<Employee>()?;
        let names: Vec<_> = structure.data_fields.iter().map(|field| field.field_name).collect();
        assert_eq!(names, vec!["name", "salary"]);

        let salary = &structure.data_fields[1];
        assert_eq!(salary.header_cell_style.fill_color, Some(IndexedColor::Gold));
        assert_eq!(salary.header_cell_style.fill_pattern, Some(FillPattern::Solid));
        assert_eq!(salary.header_cell_style.wrap_text, Some(true));
        assert_eq!(salary.header_cell_style.horizontal, Some(HorizontalAlign::Right));
        assert_eq!(salary.header_cell_style.borders, BorderSides::all(BorderStyle::Thin));
        assert_eq!(salary.data_cell_style.fill_color, Some(IndexedColor::White));
        assert_eq!(salary.data_cell_style.border_color, Some(IndexedColor::Black));
        assert_eq!(salary.data_cell_style.horizontal, Some(HorizontalAlign::Right));

        let employee = Employee {
            name: "Ada".to_owned(),
            salary: 10.5,
        };
        assert_eq!((salary.reader)(&employee), Some(CellValue::Double(10.5)));
        Ok(())
    }

    #[test]
    fn header_groups_and_merges() -> Result<(), SheetMapperError> {
        let structure = derive_structure::<Employee>()?;
        assert_eq!(structure.header_fields.len(), 1);

        let header = &structure.header_fields[0];
        assert_eq!(header.caption, "Contact");
        let captions: Vec<_> = header.column_fields.iter().map(|field| field.column.name.as_str()).collect();
        assert_eq!(captions, vec!["Phone", "Email"]);
        assert_eq!(header.column_fields[0].header_cell_style.fill_color, Some(IndexedColor::RoyalBlue));

        assert_eq!(structure.header_merge_ranges(), vec![Range::new(0, 3, 0, 4)]);
        assert!(derive_structure::<Contact>()?.header_fields.is_empty());
        Ok(())
    }

    #[test]
    fn missing_reader() {
        assert!(matches!(
            derive_structure::<WriteOnly>(),
            Err(SheetMapperError::SchemaError(crate::mapping::schema::SchemaError::MissingAccessor { .. }))
        ));
    }

    #[test]
    fn region_borders() {
        let plan = plan_region_borders(&Range::new(1, 1, 2, 3), BorderStyle::Medium);
        assert_eq!(plan.len(), 6);

        let sides = |row: usize, col: usize| plan.iter().find(|(at, _)| *at == (row, col)).map(|(_, sides)| *sides);
        assert_eq!(
            sides(1, 1),
            Some(BorderSides {
                top: Some(BorderStyle::Medium),
                left: Some(BorderStyle::Medium),
                ..BorderSides::default()
            })
        );
        assert_eq!(sides(2, 2).and_then(|sides| sides.bottom), Some(BorderStyle::Medium));
        assert_eq!(sides(2, 2).and_then(|sides| sides.top), None);
        assert_eq!(sides(2, 3).and_then(|sides| sides.right), Some(BorderStyle::Medium));

        let single = plan_region_borders(&Range::new(0, 0, 0, 0), BorderStyle::Thin);
        assert_eq!(single, vec![((0, 0), BorderSides::all(BorderStyle::Thin))]);
    }

    #[test]
    fn tall_region_borders() {
        let plan = plan_region_borders(&Range::new(0, 0, 100_000, 1), BorderStyle::Thin);
        assert_eq!(plan.len(), 200_002);
        assert!(plan.windows(2).all(|pair| pair[0].0 < pair[1].0));

        let middle = plan.iter().find(|(at, _)| *at == (50_000, 1)).map(|(_, sides)| *sides);
        assert_eq!(
            middle,
            Some(BorderSides {
                right: Some(BorderStyle::Thin),
                ..BorderSides::default()
            })
        );
        assert_eq!(plan.last().map(|(at, _)| *at), Some((100_000, 1)));
    }
}
