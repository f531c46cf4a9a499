//! Schema descriptors: field declarations and derived table shape.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DbError, Result};
use crate::value::Value;

/// Storage kinds a field may map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Integer,
    BigInt,
    Double,
    Blob,
}

impl DataType {
    /// SQL type keyword used in generated DDL.
    pub fn sql_type(self) -> &'static str {
        match self {
            DataType::Text => "TEXT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Double => "DOUBLE",
            DataType::Blob => "BLOB",
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, DataType::Integer | DataType::BigInt)
    }
}

/// A single field declaration: name, optional column override, storage kind,
/// and accessor pair.
///
/// A spec with no kind (see [`FieldSpec::unsupported`]) declares a field that
/// is never persisted or hydrated; it is skipped silently but recorded in
/// [`TableSchema::skipped_fields`].
pub struct FieldSpec<T> {
    name: &'static str,
    column: Option<&'static str>,
    kind: Option<DataType>,
    get: fn(&T) -> Value,
    set: fn(&mut T, Value),
}

impl<T> FieldSpec<T> {
    pub fn new(
        name: &'static str,
        kind: DataType,
        get: fn(&T) -> Value,
        set: fn(&mut T, Value),
    ) -> Self {
        Self {
            name,
            column: None,
            kind: Some(kind),
            get,
            set,
        }
    }

    pub fn text(name: &'static str, get: fn(&T) -> Value, set: fn(&mut T, Value)) -> Self {
        Self::new(name, DataType::Text, get, set)
    }

    pub fn integer(name: &'static str, get: fn(&T) -> Value, set: fn(&mut T, Value)) -> Self {
        Self::new(name, DataType::Integer, get, set)
    }

    pub fn big_int(name: &'static str, get: fn(&T) -> Value, set: fn(&mut T, Value)) -> Self {
        Self::new(name, DataType::BigInt, get, set)
    }

    pub fn double(name: &'static str, get: fn(&T) -> Value, set: fn(&mut T, Value)) -> Self {
        Self::new(name, DataType::Double, get, set)
    }

    pub fn blob(name: &'static str, get: fn(&T) -> Value, set: fn(&mut T, Value)) -> Self {
        Self::new(name, DataType::Blob, get, set)
    }

    /// Declares a field whose type has no storage mapping.
    pub fn unsupported(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            kind: None,
            get: |_| Value::Null,
            set: |_, _| {},
        }
    }

    /// Binds the field to an explicit column name.
    pub fn with_column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column name after override resolution.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    pub fn kind(&self) -> Option<DataType> {
        self.kind
    }

    pub(crate) fn read(&self, record: &T) -> Value {
        (self.get)(record)
    }

    pub(crate) fn write(&self, record: &mut T, value: Value) {
        (self.set)(record, value)
    }
}

// Manual impls: the accessor fn pointers are Copy for any T.
impl<T> Clone for FieldSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            column: self.column,
            kind: self.kind,
            get: self.get,
            set: self.set,
        }
    }
}

impl<T> std::fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A data type persistable by the mapper.
///
/// Implementors supply their field descriptor table once at registration;
/// `Default` provides the no-argument construction row hydration requires.
pub trait Entity: Default + 'static {
    /// Optional table-name override; the type's bare name otherwise.
    fn table() -> Option<&'static str> {
        None
    }

    /// Field descriptors in declaration order.
    fn fields() -> Vec<FieldSpec<Self>>;
}

/// Last path segment of the type name, e.g. `my_app::model::User` → `User`.
pub(crate) fn bare_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// One derived column: name, storage type, primary-key flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub data_type: DataType,
    pub primary_key: bool,
}

/// Table shape derived from an entity's field descriptors, built once per
/// registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    table: String,
    columns: Vec<ColumnDef>,
    skipped: Vec<&'static str>,
}

impl TableSchema {
    /// Derives the table name and column set for `T`.
    ///
    /// A column resolving to `id` becomes the auto-increment primary key and
    /// must be of integer kind; duplicate column names (including more than
    /// one field aliased to `id`) fail registration.
    pub fn derive<T: Entity>() -> Result<TableSchema> {
        let table = match T::table() {
            Some(name) => name.to_string(),
            None => bare_type_name::<T>().to_string(),
        };

        let mut columns: Vec<ColumnDef> = Vec::new();
        let mut skipped = Vec::new();
        for spec in T::fields() {
            let Some(kind) = spec.kind() else {
                skipped.push(spec.name());
                continue;
            };
            let name = spec.column_name();
            if columns.iter().any(|c| c.name == name) {
                return Err(DbError::schema(
                    &table,
                    format!("duplicate column name `{name}`"),
                ));
            }
            let primary_key = name == "id";
            if primary_key && !kind.is_integer() {
                return Err(DbError::schema(
                    &table,
                    format!(
                        "primary key column `id` must be an integer kind, got {}",
                        kind.sql_type()
                    ),
                ));
            }
            columns.push(ColumnDef {
                name,
                data_type: kind,
                primary_key,
            });
        }

        let schema = TableSchema {
            table,
            columns,
            skipped,
        };
        if !schema.skipped.is_empty() {
            debug!(
                table = %schema.table,
                fields = ?schema.skipped,
                "fields without a storage mapping are excluded from the table"
            );
        }
        Ok(schema)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Names of declared fields excluded from schema, codec, and cache.
    pub fn skipped_fields(&self) -> &[&'static str] {
        &self.skipped
    }

    /// Idempotent DDL for this table.
    ///
    /// SQLite only allows AUTOINCREMENT on an INTEGER PRIMARY KEY, so the
    /// `id` column always renders as INTEGER even when declared `BigInt`
    /// (SQLite integers are 8 bytes either way).
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.primary_key {
                    format!("{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL", c.name)
                } else {
                    format!("{} {}", c.name, c.data_type.sql_type())
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {}({})", self.table, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Sample {
        id: Option<i64>,
        label: Option<String>,
        ratio: Option<f64>,
    }

    impl Entity for Sample {
        fn fields() -> Vec<FieldSpec<Self>> {
            vec![
                FieldSpec::text("label", |s| s.label.clone().into(), |s, v| {
                    s.label = v.into_text()
                }),
                FieldSpec::double("ratio", |s| s.ratio.into(), |s, v| s.ratio = v.into_f64()),
                FieldSpec::unsupported("extras"),
                FieldSpec::big_int("id", |s| s.id.into(), |s, v| s.id = v.into_i64()),
            ]
        }
    }

    #[derive(Debug, Default)]
    struct TwoIds {
        id: Option<i64>,
        key: Option<i64>,
    }

    impl Entity for TwoIds {
        fn fields() -> Vec<FieldSpec<Self>> {
            vec![
                FieldSpec::big_int("id", |s| s.id.into(), |s, v| s.id = v.into_i64()),
                FieldSpec::big_int("key", |s: &TwoIds| s.key.into(), |s, v| s.key = v.into_i64())
                    .with_column("id"),
            ]
        }
    }

    #[derive(Debug, Default)]
    struct TextId {
        id: Option<String>,
    }

    impl Entity for TextId {
        fn fields() -> Vec<FieldSpec<Self>> {
            vec![FieldSpec::text("id", |s| s.id.clone().into(), |s, v| {
                s.id = v.into_text()
            })]
        }
    }

    #[test]
    fn ddl_skips_unmapped_fields_and_keys_id() {
        let schema = TableSchema::derive::<Sample>().unwrap();
        assert_eq!(
            schema.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS Sample(label TEXT, ratio DOUBLE, \
             id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL)"
        );
        assert_eq!(schema.skipped_fields(), &["extras"]);
    }

    #[test]
    fn id_is_primary_key_regardless_of_position() {
        let schema = TableSchema::derive::<Sample>().unwrap();
        let id = schema.columns().iter().find(|c| c.name == "id").unwrap();
        assert!(id.primary_key);
        assert!(schema
            .columns()
            .iter()
            .filter(|c| c.name != "id")
            .all(|c| !c.primary_key));
    }

    #[derive(Debug, Default)]
    struct Tag {
        label: Option<String>,
    }

    impl Entity for Tag {
        fn fields() -> Vec<FieldSpec<Self>> {
            vec![FieldSpec::text("label", |t| t.label.clone().into(), |t, v| {
                t.label = v.into_text()
            })]
        }
    }

    #[test]
    fn entity_without_id_gets_no_primary_key() {
        let schema = TableSchema::derive::<Tag>().unwrap();
        assert_eq!(
            schema.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS Tag(label TEXT)"
        );
        assert!(schema.columns().iter().all(|c| !c.primary_key));
    }

    #[test]
    fn duplicate_id_columns_fail_registration() {
        let err = TableSchema::derive::<TwoIds>().unwrap_err();
        assert!(matches!(err, DbError::Schema { .. }));
    }

    #[test]
    fn non_integer_id_fails_registration() {
        let err = TableSchema::derive::<TextId>().unwrap_err();
        assert!(matches!(err, DbError::Schema { .. }));
    }

    #[test]
    fn bare_name_drops_module_path() {
        assert_eq!(bare_type_name::<Sample>(), "Sample");
    }
}
