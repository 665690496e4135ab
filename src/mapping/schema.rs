//! Registration of record types and the process-wide schema registry.

use crate::error::SheetMapperError;
use crate::mapping::column::CellValue;
use crate::mapping::column::ExcelColumn;
use crate::mapping::column::ExcelFile;
use crate::mapping::column::ExcelHeader;
use crate::mapping::column::FieldDescriptor;
use crate::mapping::column::FieldValue;
use crate::mapping::column::ReadAccessor;
use crate::mapping::column::WriteAccessor;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::type_name;
use std::any::Any;
use std::any::TypeId;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors in the metadata registered for a record type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Field '{field}' of '{record}' has no accessor for this direction")]
    MissingAccessor { record: String, field: String },

    #[error("Invalid configuration of '{record}': {message}")]
    InvalidConfiguration { record: String, message: String },
}

/// A record type that can be mapped to and from spreadsheet rows.
///
/// ```
/// use sheet_mapper::{ExcelColumn, ExcelFile, SchemaBuilder, SheetRecord};
///
/// #[derive(Default)]
/// struct User {
///     name: String,
///     age: Option<i32>,
/// }
///
/// impl SheetRecord for User {
///     fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
///         builder
///             .file(ExcelFile::new("users").sheet_name("Users"))
///             .column("name", ExcelColumn::new(0, "Name"), |user| user.name.clone(), |user, name| user.name = name)
///             .column("age", ExcelColumn::new(1, "Age"), |user| user.age, |user, age| user.age = age)
///     }
/// }
///
/// let schema = sheet_mapper::schema_of::<User>().unwrap();
/// assert_eq!(schema.fields().len(), 2);
/// ```
pub trait SheetRecord: Sized + 'static {
    fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self>;
}

/// A header group field, resolved against its nested record type on demand.
#[derive(Clone)]
pub struct HeaderDescriptor {
    pub(crate) field_name: &'static str,
    pub(crate) header: ExcelHeader,
    columns: fn() -> Result<Vec<ExcelColumn>, SheetMapperError>,
}

impl HeaderDescriptor {
    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    pub fn header(&self) -> &ExcelHeader {
        &self.header
    }

    /// Column metadata of the nested record type (not expanded any further).
    pub fn columns(&self) -> Result<Vec<ExcelColumn>, SheetMapperError> {
        (self.columns)()
    }
}

impl std::fmt::Debug for HeaderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderDescriptor")
            .field("field_name", &self.field_name)
            .field("header", &self.header)
            .finish()
    }
}

fn nested_columns<S: SheetRecord>() -> Result<Vec<ExcelColumn>, SheetMapperError> {
    Ok(schema_of::<S>()?.columns())
}

/// Collects the field descriptors of a record type.
pub struct SchemaBuilder<T> {
    record: &'static str,
    file: ExcelFile,
    fields: Vec<FieldDescriptor<T>>,
    headers: Vec<HeaderDescriptor>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub(crate) fn new() -> Self {
        SchemaBuilder {
            record: type_name::<T>(),
            file: ExcelFile::default(),
            fields: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Sets export naming and header size.
    pub fn file(mut self, file: ExcelFile) -> Self {
        self.file = file;
        self
    }

    /// Registers a field that is both exported and imported.
    pub fn column<V, R, W>(self, field_name: &'static str, column: ExcelColumn, reader: R, writer: W) -> Self
    where
        V: FieldValue + 'static,
        R: Fn(&T) -> V + Send + Sync + 'static,
        W: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push::<V>(field_name, column, Some(read_accessor(reader)), Some(write_accessor(writer)))
    }

    /// Registers an export-only field.
    pub fn read_column<V, R>(self, field_name: &'static str, column: ExcelColumn, reader: R) -> Self
    where
        V: FieldValue + 'static,
        R: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.push::<V>(field_name, column, Some(read_accessor(reader)), None)
    }

    /// Registers an import-only field.
    pub fn write_column<V, W>(self, field_name: &'static str, column: ExcelColumn, writer: W) -> Self
    where
        V: FieldValue + 'static,
        W: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push::<V>(field_name, column, None, Some(write_accessor(writer)))
    }

    /// Registers a header group whose child columns are the columns of `S`.
    pub fn header<S: SheetRecord>(mut self, field_name: &'static str, header: ExcelHeader) -> Self {
        self.headers.push(HeaderDescriptor {
            field_name,
            header,
            columns: nested_columns::<S>,
        });
        self
    }

    fn push<V: FieldValue>(
        mut self,
        field_name: &'static str,
        column: ExcelColumn,
        reader: Option<ReadAccessor<T>>,
        writer: Option<WriteAccessor<T>>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            field_name,
            column,
            target_type: V::TARGET_TYPE,
            reader,
            writer,
        });
        self
    }

    /// Validates the collected metadata.
    pub(crate) fn build(self) -> Result<RecordSchema<T>, SchemaError> {
        let record = self.record;
        let invalid = move |message: String| SchemaError::InvalidConfiguration {
            record: record.to_owned(),
            message,
        };
        if self.file.header_index < 1 {
            return Err(invalid(format!(
                "header index must be at least 1, got {}",
                self.file.header_index
            )));
        }
        let mut indexes = HashSet::new();
        for field in &self.fields {
            if !indexes.insert(field.column.index) {
                return Err(invalid(format!(
                    "column index {} of field '{}' is already mapped",
                    field.column.index, field.field_name
                )));
            }
            if field.column.col_span == 0 || field.column.row_span == 0 {
                return Err(invalid(format!("field '{}' spans no cells", field.field_name)));
            }
        }
        Ok(RecordSchema {
            record,
            file: self.file,
            fields: self.fields,
            headers: self.headers,
        })
    }
}

fn read_accessor<T, V, R>(reader: R) -> ReadAccessor<T>
where
    T: 'static,
    V: FieldValue + 'static,
    R: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |record: &T| reader(record).to_cell_value())
}

fn write_accessor<T, V, W>(writer: W) -> WriteAccessor<T>
where
    T: 'static,
    V: FieldValue + 'static,
    W: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |record: &mut T, value: CellValue| {
        if let Some(value) = V::from_cell_value(value) {
            writer(record, value);
        }
    })
}

/// The validated, immutable metadata of one record type.
#[derive(Debug)]
pub struct RecordSchema<T> {
    record: &'static str,
    file: ExcelFile,
    fields: Vec<FieldDescriptor<T>>,
    headers: Vec<HeaderDescriptor>,
}

impl<T> RecordSchema<T> {
    /// Type name of the record
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn file(&self) -> &ExcelFile {
        &self.file
    }

    /// Data-column descriptors in registration order
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Header groups in registration order
    pub fn headers(&self) -> &[HeaderDescriptor] {
        &self.headers
    }

    /// Column metadata of every data field
    pub fn columns(&self) -> Vec<ExcelColumn> {
        self.fields.iter().map(|field| field.column.clone()).collect()
    }

    pub fn header_offset(&self) -> usize {
        self.file.header_index
    }

    pub(crate) fn missing_accessor(&self, field: &FieldDescriptor<T>) -> SchemaError {
        SchemaError::MissingAccessor {
            record: self.record.to_owned(),
            field: field.field_name.to_owned(),
        }
    }

    pub(crate) fn invalid_configuration(&self, message: String) -> SchemaError {
        SchemaError::InvalidConfiguration {
            record: self.record.to_owned(),
            message,
        }
    }
}

type Registry = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the schema of `T`, describing and validating it on first use.
///
/// Schemas are cached per type for the lifetime of the process; invalid
/// metadata is reported on every call and never cached.
pub fn schema_of<T: SheetRecord>() -> Result<Arc<RecordSchema<T>>, SheetMapperError> {
    let key = TypeId::of::<T>();
    if let Some(schema) = REGISTRY.read().get(&key).cloned() {
        return downcast(schema);
    }

    // Described outside the lock: nested record types register themselves too.
    let schema: Arc<dyn Any + Send + Sync> = Arc::new(T::describe(SchemaBuilder::new()).build()?);
    debug!("Registered record schema '{}'", type_name::<T>());
    let schema = REGISTRY.write().entry(key).or_insert(schema).clone();
    downcast(schema)
}

fn downcast<T: SheetRecord>(schema: Arc<dyn Any + Send + Sync>) -> Result<Arc<RecordSchema<T>>, SheetMapperError> {
    schema.downcast::<RecordSchema<T>>().map_err(|_| {
        SheetMapperError::WithContextError(format!("schema registry entry of '{}' has a foreign type", type_name::<T>()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Address {
        city: String,
    }

    impl SheetRecord for Address {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder.column("city", ExcelColumn::new(4, "City"), |address| address.city.clone(), |address, city| address.city = city)
        }
    }

    #[derive(Default)]
    struct Person {
        name: String,
        age: Option<i64>,
    }

    impl SheetRecord for Person {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder
                .file(ExcelFile::new("people").sheet_name("People").header_index(2))
                .header::<Address>("address", ExcelHeader::new(0, "Address"))
                .column("name", ExcelColumn::new(1, "Name"), |person| person.name.clone(), |person, name| person.name = name)
                .write_column("age", ExcelColumn::new(0, "Age"), |person: &mut Person, age| person.age = age)
        }
    }

    struct Duplicated;

    impl SheetRecord for Duplicated {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder
                .read_column("a", ExcelColumn::new(0, "A"), |_| 1i32)
                .read_column("b", ExcelColumn::new(0, "B"), |_| 2i32)
        }
    }

    struct ZeroHeader;

    impl SheetRecord for ZeroHeader {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder.file(ExcelFile::new("zero").header_index(0))
        }
    }

    struct ZeroSpan;

    impl SheetRecord for ZeroSpan {
        fn describe(builder: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            builder.read_column("a", ExcelColumn::new(0, "A").row_span(0), |_| 1i32)
        }
    }

    #[test]
    fn register_once() -> Result<(), SheetMapperError> {
        let first = schema_of::<Person>()?;
        let second = schema_of::<Person>()?;
        assert!(Arc::ptr_eq(&first, &second));

        assert_eq!(first.header_offset(), 2);
        assert_eq!(first.file().sheet_name, "People");
        assert_eq!(first.fields().len(), 2);
        assert_eq!(first.fields()[1].field_name(), "age");
        assert!(first.fields()[1].reader().is_none());
        assert!(first.fields()[1].writer().is_some());

        let headers = first.headers();
        assert_eq!(headers.len(), 1);
        let columns = headers[0].columns()?;
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "City");
        Ok(())
    }

    #[test]
    fn accessors_move_typed_values() -> Result<(), SheetMapperError> {
        let schema = schema_of::<Person>()?;
        let mut person = Person::default();
        let age = schema.fields()[1].writer().expect("age writer");
        age(&mut person, CellValue::Long(42));
        age(&mut person, CellValue::Text("ignored".to_owned()));
        assert_eq!(person.age, Some(42));

        person.name = "Ada".to_owned();
        let name = schema.fields()[0].reader().expect("name reader");
        assert_eq!(name(&person), Some(CellValue::Text("Ada".to_owned())));
        Ok(())
    }

    #[test]
    fn reject_invalid_metadata() {
        for result in [
            schema_of::<Duplicated>().map(|_| ()),
            schema_of::<ZeroHeader>().map(|_| ()),
            schema_of::<ZeroSpan>().map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(SheetMapperError::SchemaError(SchemaError::InvalidConfiguration { .. }))
            ));
        }
    }
}
