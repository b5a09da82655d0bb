//! Result rows returned by an [`Executor`](crate::Executor).

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// One result row: the statement's column names plus positional values.
///
/// Column names are shared between all rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Get a column by position and convert it.
    pub fn try_get<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let column = self
            .columns
            .get(idx)
            .map(String::as_str)
            .unwrap_or("<unnamed>");
        let value = self
            .values
            .get(idx)
            .cloned()
            .ok_or_else(|| OrmError::decode(column, format!("no column at index {idx}")))?;
        T::from_value(value).map_err(|e| OrmError::decode(column, e.to_string()))
    }

    /// Get a column by name and convert it.
    pub fn try_get_column<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;
        self.try_get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        Row::new(columns, vec![Value::Int(7), Value::Text("ann".into())])
    }

    #[test]
    fn get_by_position_and_name() {
        let row = row();
        assert_eq!(row.try_get::<i64>(0).unwrap(), 7);
        assert_eq!(row.try_get_column::<String>("name").unwrap(), "ann");
    }

    #[test]
    fn conversion_failure_names_the_column() {
        let err = row().try_get_column::<i64>("name").unwrap_err();
        match err {
            OrmError::Decode { column, .. } => assert_eq!(column, "name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_a_decode_error() {
        assert!(matches!(
            row().try_get_column::<i64>("email"),
            Err(OrmError::Decode { .. })
        ));
        assert!(matches!(row().try_get::<i64>(5), Err(OrmError::Decode { .. })));
    }
}
