//! Record descriptors: the column mapping of a record type.
//!
//! A type becomes a record by implementing [`Record`], usually through
//! `#[derive(Record)]`. The implementation describes the type once as a
//! [`FieldInfo`]: an ordered list of columns, each with a getter (field → value)
//! and a setter (value → field). That order fixes the column list of every
//! statement built for the type and the order in which result columns are
//! written back into fields.
//!
//! # Manual registration
//!
//! ```ignore
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Record for User {
//!     const TABLE: &'static str = "users";
//!
//!     fn describe() -> OrmResult<FieldInfo<Self>> {
//!         Self::fields()
//!             .field("id", |u| u.id.to_value(), |u, v| { u.id = FromValue::from_value(v)?; Ok(()) })
//!             .primary_key()
//!             .field("name", |u| u.name.to_value(), |u, v| { u.name = FromValue::from_value(v)?; Ok(()) })
//!             .build()
//!     }
//! }
//! ```

use crate::error::{OrmError, OrmResult};
use crate::ident::validate_column;
use crate::registry::TypeRegistry;
use crate::row::Row;
use crate::value::{Value, ValueError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Reads one field of `T` as a query argument.
pub type Getter<T> = fn(&T) -> Result<Value, ValueError>;

/// Writes one column value into a field of `T`.
pub type Setter<T> = fn(&mut T, Value) -> Result<(), ValueError>;

/// A type that maps onto a table row.
pub trait Record: Send + Sync + 'static {
    /// Table used by the record-typed operations on [`Db`](crate::Db).
    const TABLE: &'static str;

    /// Build the column mapping for this type.
    ///
    /// Called at most once per [`TypeRegistry`] on success; the result is cached.
    fn describe() -> OrmResult<FieldInfo<Self>>
    where
        Self: Sized;

    /// An empty builder for this type, for use in [`describe`](Self::describe).
    fn fields() -> FieldInfoBuilder<Self>
    where
        Self: Sized,
    {
        FieldInfo::builder()
    }
}

/// One mapped field.
pub struct FieldMapping<T> {
    column: String,
    get: Getter<T>,
    set: Setter<T>,
    primary_key: bool,
}

impl<T> FieldMapping<T> {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Encode the field; fails with `InvalidArgument` naming the column.
    pub fn get(&self, record: &T) -> OrmResult<Value> {
        (self.get)(record).map_err(|e| {
            OrmError::invalid_argument(format!("cannot encode column '{}': {e}", self.column))
        })
    }

    pub fn set(&self, record: &mut T, value: Value) -> OrmResult<()> {
        (self.set)(record, value).map_err(|e| OrmError::decode(&self.column, e.to_string()))
    }
}

/// The cached column mapping of one record type.
///
/// Immutable once built; column names are unique and non-empty.
pub struct FieldInfo<T> {
    fields: Vec<FieldMapping<T>>,
    columns: Arc<[String]>,
}

impl<T> FieldInfo<T> {
    pub fn builder() -> FieldInfoBuilder<T> {
        FieldInfoBuilder { fields: Vec::new() }
    }

    /// Column names in mapping order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn shared_columns(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    pub fn fields(&self) -> &[FieldMapping<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields marked as primary key, in mapping order.
    pub fn primary_key(&self) -> impl Iterator<Item = &FieldMapping<T>> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    /// Read every mapped field of `record`, in column order.
    pub fn values(&self, record: &T) -> OrmResult<Vec<Value>> {
        self.fields.iter().map(|f| f.get(record)).collect()
    }

    /// Write a row into `record`: column `i` of the row goes to field `i`.
    ///
    /// The row must have been produced by a statement selecting exactly
    /// [`columns`](Self::columns), in that order. Fields are written as they
    /// decode, so on error `record` may be partly written; use
    /// [`scan_into`](Self::scan_into) to keep an existing value intact.
    pub fn scan(&self, row: Row, record: &mut T) -> OrmResult<()> {
        if row.len() != self.fields.len() {
            return Err(OrmError::decode(
                row.columns().first().map(String::as_str).unwrap_or("<row>"),
                format!(
                    "row has {} columns, record maps {}",
                    row.len(),
                    self.fields.len()
                ),
            ));
        }
        for (field, value) in self.fields.iter().zip(row.into_values()) {
            field.set(record, value)?;
        }
        Ok(())
    }

    /// Like [`scan`](Self::scan), but `record` is only replaced once every
    /// column has decoded. Unmapped fields keep their current values.
    pub fn scan_into(&self, row: Row, record: &mut T) -> OrmResult<()>
    where
        T: Clone,
    {
        let mut decoded = record.clone();
        self.scan(row, &mut decoded)?;
        *record = decoded;
        Ok(())
    }
}

impl<T> std::fmt::Debug for FieldInfo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldInfo")
            .field("type", &std::any::type_name::<T>())
            .field("columns", &self.columns)
            .finish()
    }
}

/// Builder for [`FieldInfo`]; `build` validates the mapping.
pub struct FieldInfoBuilder<T> {
    fields: Vec<FieldMapping<T>>,
}

impl<T> FieldInfoBuilder<T> {
    /// Map a column to a field through its getter and setter.
    pub fn field(mut self, column: impl Into<String>, get: Getter<T>, set: Setter<T>) -> Self {
        self.fields.push(FieldMapping {
            column: column.into(),
            get,
            set,
            primary_key: false,
        });
        self
    }

    /// Mark the most recently added field as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.primary_key = true;
        }
        self
    }

    pub fn build(self) -> OrmResult<FieldInfo<T>> {
        let type_name = std::any::type_name::<T>();
        if self.fields.is_empty() {
            return Err(OrmError::invalid_argument(format!(
                "record type {type_name} maps no columns"
            )));
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            validate_column(&field.column)?;
            if !seen.insert(field.column.as_str()) {
                return Err(OrmError::invalid_argument(format!(
                    "record type {type_name} maps column '{}' more than once",
                    field.column
                )));
            }
        }

        let columns: Arc<[String]> = self.fields.iter().map(|f| f.column.clone()).collect();
        Ok(FieldInfo {
            fields: self.fields,
            columns,
        })
    }
}

/// An explicit, ordered list of column/value pairs.
///
/// Bypasses record descriptors entirely: statements use the columns in the
/// order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedFields {
    pairs: Vec<(String, Value)>,
}

impl NamedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; setting an existing column replaces its value in place.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.pairs.push((column, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for NamedFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = NamedFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// Column order follows the map's iteration order, which is unspecified.
impl From<HashMap<String, Value>> for NamedFields {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for NamedFields {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Column names plus the matching argument values, ready for SQL generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    pub names: Arc<[String]>,
    pub values: Vec<Value>,
}

impl Columns {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Object-safe view of a [`Record`] value used by [`ColumnSource`].
pub trait DynRecord: Send + Sync {
    fn columns(&self, registry: &TypeRegistry) -> OrmResult<Columns>;

    fn type_name(&self) -> &'static str;
}

impl<T: Record> DynRecord for T {
    fn columns(&self, registry: &TypeRegistry) -> OrmResult<Columns> {
        let info = registry.field_info::<T>()?;
        Ok(Columns {
            names: info.shared_columns(),
            values: info.values(self)?,
        })
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Where the columns and values of a write come from.
#[derive(Clone, Copy)]
pub enum ColumnSource<'a> {
    /// Explicit column/value pairs, in list order.
    NamedFields(&'a NamedFields),
    /// A record, in its descriptor's column order.
    TypedRecord(&'a dyn DynRecord),
}

impl ColumnSource<'_> {
    /// Resolve the columns and values; fails on an empty or invalid column list.
    pub fn resolve(&self, registry: &TypeRegistry) -> OrmResult<Columns> {
        match self {
            ColumnSource::NamedFields(fields) => {
                if fields.is_empty() {
                    return Err(OrmError::invalid_argument("named fields contain no columns"));
                }
                for (column, _) in fields.iter() {
                    validate_column(column)?;
                }
                let names: Arc<[String]> = fields.iter().map(|(c, _)| c.to_string()).collect();
                let values = fields.iter().map(|(_, v)| v.clone()).collect();
                Ok(Columns { names, values })
            }
            ColumnSource::TypedRecord(record) => record.columns(registry),
        }
    }
}

impl std::fmt::Debug for ColumnSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnSource::NamedFields(fields) => f.debug_tuple("NamedFields").field(fields).finish(),
            ColumnSource::TypedRecord(record) => {
                f.debug_tuple("TypedRecord").field(&record.type_name()).finish()
            }
        }
    }
}

impl<'a> From<&'a NamedFields> for ColumnSource<'a> {
    fn from(fields: &'a NamedFields) -> Self {
        ColumnSource::NamedFields(fields)
    }
}

impl<'a, T: Record> From<&'a T> for ColumnSource<'a> {
    fn from(record: &'a T) -> Self {
        ColumnSource::TypedRecord(record)
    }
}
