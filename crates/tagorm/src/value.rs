//! Dynamically typed SQL values and conversions to and from Rust types.
//!
//! Query arguments and row columns travel as [`Value`]. Record fields convert
//! through [`ToValue`] (field → argument) and [`FromValue`] (column → field).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use uuid::Uuid;

/// A single SQL argument or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    /// Short name of the value's kind, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Json(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Uuid(v) => write!(f, "{v}"),
        }
    }
}

/// A column value that could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {found} into {expected}{}", .detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
pub struct ValueError {
    pub expected: &'static str,
    pub found: &'static str,
    pub detail: Option<String>,
}

impl ValueError {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.kind(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

/// Conversion of a record field into a query argument.
///
/// Fallible so that encodings which can reject a value (serializing a
/// [`Json`] payload) surface the failure instead of writing a placeholder.
pub trait ToValue {
    fn to_value(&self) -> Result<Value, ValueError>;
}

/// Conversion of a column value back into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, ValueError> {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, ValueError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Bool(*self))
    }
}

// Backends without a boolean type hand back 0/1.
impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => Err(ValueError::new("bool", &other)),
        }
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Int(*self))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Bool(v) => Ok(i64::from(v)),
            other => Err(ValueError::new("i64", &other)),
        }
    }
}

macro_rules! impl_small_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, ValueError> {
                    Ok(Value::Int(i64::from(*self)))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).map_err(|e| {
                            ValueError::new(stringify!($ty), &Value::Int(v)).with_detail(e)
                        }),
                        other => Err(ValueError::new(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

impl_small_int!(i8, i16, i32, u8, u16, u32);

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(v) => u64::try_from(v)
                .map_err(|e| ValueError::new("u64", &Value::Int(v)).with_detail(e)),
            other => Err(ValueError::new("u64", &other)),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(*self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(ValueError::new("f64", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(ValueError::new("String", &other)),
        }
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Bytes(self.to_vec()))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            other => Err(ValueError::new("Vec<u8>", &other)),
        }
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Json(self.clone()))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Text(v) => serde_json::from_str(&v)
                .map_err(|e| ValueError::new("json", &Value::Text(String::new())).with_detail(e)),
            other => Err(ValueError::new("json", &other)),
        }
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl ToValue for NaiveDate {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Date(*self))
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Date(v) => Ok(v),
            Value::Text(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|e| ValueError::new("NaiveDate", &Value::Text(v)).with_detail(e)),
            other => Err(ValueError::new("NaiveDate", &other)),
        }
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::DateTime(*self))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::DateTime(v) => Ok(v),
            Value::Text(v) => DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&v, fmt).ok())
                .ok_or_else(|| ValueError::new("NaiveDateTime", &Value::Text(v))),
            other => Err(ValueError::new("NaiveDateTime", &other)),
        }
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Timestamp(*self))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::DateTime(v) => Ok(v.and_utc()),
            Value::Text(v) => DateTime::parse_from_rfc3339(&v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ValueError::new("DateTime<Utc>", &Value::Text(v)).with_detail(e)),
            other => Err(ValueError::new("DateTime<Utc>", &other)),
        }
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Uuid(*self))
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::Text(v) => Uuid::parse_str(&v)
                .map_err(|e| ValueError::new("Uuid", &Value::Text(v)).with_detail(e)),
            Value::Bytes(v) => Uuid::from_slice(&v)
                .map_err(|e| ValueError::new("Uuid", &Value::Bytes(v)).with_detail(e)),
            other => Err(ValueError::new("Uuid", &other)),
        }
    }
}

/// Stores a serde-serializable value in a JSON column.
///
/// ```ignore
/// #[derive(Record, Default)]
/// struct Event {
///     id: i64,
///     payload: Json<Payload>,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Result<Value, ValueError> {
        serde_json::to_value(&self.0).map(Value::Json).map_err(|e| ValueError {
            expected: "json",
            found: std::any::type_name::<T>(),
            detail: Some(e.to_string()),
        })
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let json = serde_json::Value::from_value(value)?;
        serde_json::from_value(json)
            .map(Json)
            .map_err(|e| ValueError::new("Json<T>", &Value::Json(serde_json::Value::Null)).with_detail(e))
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Infallible argument conversion behind [`args!`](crate::args).
///
/// Covers every type with an `Into<Value>` conversion. `Json` has none; its
/// encoding can fail and goes through [`ToValue`].
pub trait ToArg {
    fn to_arg(&self) -> Value;
}

impl<T: Clone + Into<Value>> ToArg for T {
    fn to_arg(&self) -> Value {
        self.clone().into()
    }
}

/// Build a `Vec<Value>` argument list from Rust values.
///
/// ```ignore
/// table.select(&mut users, "age > ? and name like ?", &args![18, "a%"]).await?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::ToArg::to_arg(&$arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_narrow_with_range_check() {
        assert_eq!(i32::from_value(Value::Int(42)).unwrap(), 42);
        let err = i8::from_value(Value::Int(1000)).unwrap_err();
        assert_eq!(err.expected, "i8");
        assert_eq!(err.found, "integer");
        assert!(err.detail.is_some());
    }

    #[test]
    fn bool_accepts_zero_and_one() {
        assert!(!bool::from_value(Value::Int(0)).unwrap());
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert!(bool::from_value(Value::Int(2)).is_err());
    }

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::Text("x".into())).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(None::<i64>.to_value().unwrap(), Value::Null);
    }

    #[test]
    fn text_columns_parse_into_temporal_types() {
        let dt = NaiveDateTime::from_value(Value::Text("2024-03-01 12:30:00".into())).unwrap();
        assert_eq!(dt.to_string(), "2024-03-01 12:30:00");

        let ts = DateTime::<Utc>::from_value(Value::Text("2024-03-01T12:30:00Z".into())).unwrap();
        assert_eq!(ts.timestamp(), 1_709_296_200);

        let date = NaiveDate::from_value(Value::Text("2024-03-01".into())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn uuid_parses_from_text() {
        let id = Uuid::new_v4();
        assert_eq!(Uuid::from_value(Value::Text(id.to_string())).unwrap(), id);
    }

    #[test]
    fn json_wrapper_serializes_structs() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Prefs {
            theme: String,
        }

        let v = Json(Prefs {
            theme: "dark".into(),
        })
        .to_value()
        .unwrap();
        assert_eq!(v, Value::Json(serde_json::json!({ "theme": "dark" })));

        let back = Json::<Prefs>::from_value(Value::Text(r#"{"theme":"light"}"#.into())).unwrap();
        assert_eq!(back.0.theme, "light");
    }

    #[test]
    fn json_with_non_string_keys_fails_to_encode() {
        let mut grid = std::collections::HashMap::new();
        grid.insert((1, 2), 3);
        let err = Json(grid).to_value().unwrap_err();
        assert_eq!(err.expected, "json");
        assert!(err.found.contains("HashMap"), "{err}");
        assert!(err.detail.is_some());

        let none: Option<Json<Vec<i32>>> = None;
        assert_eq!(none.to_value().unwrap(), Value::Null);
    }

    #[test]
    fn args_macro_converts_in_order() {
        let args = args![1_i64, "bob", None::<i32>];
        assert_eq!(
            args,
            vec![Value::Int(1), Value::Text("bob".into()), Value::Null]
        );
        assert!(args![].is_empty());
    }
}
