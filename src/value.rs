//! Core value types for SQLite operations.

use std::fmt;

use indexmap::IndexMap;
use rusqlite::types::{ToSqlOutput, Value as StoredValue, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::schema::DataType;

/// A single field value in the storage engine's representation.
///
/// `Null` doubles as "absent": a filter field or value-map entry holding
/// `Null` is omitted rather than written as SQL NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Ordered column-name → value mapping, built per operation from a record
/// instance and discarded after the call.
pub type ValueMap = IndexMap<&'static str, Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_i64(self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn into_i32(self) -> Option<i32> {
        match self {
            Value::Integer(i) => i32::try_from(i).ok(),
            _ => None,
        }
    }

    pub fn into_f64(self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_blob(self) -> Option<Vec<u8>> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Whether this value is writable to a column of the given kind.
    pub(crate) fn matches(&self, kind: DataType) -> bool {
        matches!(
            (self, kind),
            (Value::Text(_), DataType::Text)
                | (Value::Integer(_), DataType::Integer)
                | (Value::Integer(_), DataType::BigInt)
                | (Value::Real(_), DataType::Double)
                | (Value::Blob(_), DataType::Blob)
        )
    }

    /// Converts a value read back from the engine into the representation the
    /// field's declared kind expects.
    ///
    /// SQLite columns are dynamically typed, so lossless cross-conversions
    /// (numeric widening, numeric text) are accepted. `None` means NULL or an
    /// unconvertible value; the caller leaves the field at its default.
    pub(crate) fn from_stored(kind: DataType, stored: StoredValue) -> Option<Value> {
        if matches!(stored, StoredValue::Null) {
            return None;
        }
        let converted = match kind {
            DataType::Text => match stored {
                StoredValue::Text(s) => Some(Value::Text(s)),
                StoredValue::Integer(i) => Some(Value::Text(i.to_string())),
                StoredValue::Real(r) => Some(Value::Text(r.to_string())),
                _ => None,
            },
            DataType::Integer | DataType::BigInt => match stored {
                StoredValue::Integer(i) => Some(Value::Integer(i)),
                // The upper bound is exclusive: `i64::MAX as f64` rounds up
                // to 2^63, which no i64 can hold; anything integral below it
                // casts exactly.
                StoredValue::Real(r)
                    if r.fract() == 0.0 && r >= i64::MIN as f64 && r < i64::MAX as f64 =>
                {
                    Some(Value::Integer(r as i64))
                }
                StoredValue::Text(ref s) => s.trim().parse().ok().map(Value::Integer),
                _ => None,
            },
            DataType::Double => match stored {
                StoredValue::Real(r) => Some(Value::Real(r)),
                StoredValue::Integer(i) => Some(Value::Real(i as f64)),
                StoredValue::Text(ref s) => s.trim().parse().ok().map(Value::Real),
                _ => None,
            },
            DataType::Blob => match stored {
                StoredValue::Blob(b) => Some(Value::Blob(b)),
                _ => None,
            },
        };
        if converted.is_none() {
            warn!(?kind, "stored value does not convert to the declared kind; leaving default");
        }
        converted
    }
}

/// Uniform stringification, used for diagnostics only; parameters always bind
/// through [`ToSql`] with their native type.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => {
                f.write_str("x'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(StoredValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(StoredValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(StoredValue::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_option_maps_to_null() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert!(Value::from(none).is_null());
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn stored_null_is_absent() {
        assert_eq!(Value::from_stored(DataType::Text, StoredValue::Null), None);
    }

    #[test]
    fn integral_reals_convert_only_within_i64_range() {
        assert_eq!(
            Value::from_stored(DataType::BigInt, StoredValue::Real(3.0)),
            Some(Value::Integer(3))
        );
        assert_eq!(
            Value::from_stored(DataType::BigInt, StoredValue::Real(i64::MIN as f64)),
            Some(Value::Integer(i64::MIN))
        );
        // 2^63 is integral but unrepresentable as i64; it must not clamp.
        assert_eq!(
            Value::from_stored(DataType::BigInt, StoredValue::Real(9.223372036854776e18)),
            None
        );
        assert_eq!(
            Value::from_stored(DataType::Integer, StoredValue::Real(-1.0e300)),
            None
        );
    }

    #[test]
    fn numeric_text_converts_to_integer() {
        assert_eq!(
            Value::from_stored(DataType::BigInt, StoredValue::Text("42".into())),
            Some(Value::Integer(42))
        );
        assert_eq!(
            Value::from_stored(DataType::Integer, StoredValue::Blob(vec![1])),
            None
        );
    }
}
