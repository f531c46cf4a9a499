//! The DAO engine: derived CRUD operations for one registered type.

use std::sync::{Arc, Mutex};

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::cache::FieldCache;
use crate::condition::Condition;
use crate::error::Result;
use crate::schema::{Entity, TableSchema};
use crate::value::{Value, ValueMap};

/// Data-access object for a single entity type.
///
/// Construction derives the table schema, executes the idempotent DDL, and
/// builds the field cache; on failure nothing is retained. Every operation is
/// a single blocking round trip on the shared connection.
pub struct Dao<T: Entity> {
    conn: Arc<Mutex<Connection>>,
    schema: TableSchema,
    cache: FieldCache<T>,
}

impl<T: Entity> Dao<T> {
    /// Registers `T` against the shared handle: create table if absent, then
    /// probe it to build the column cache. Safe to call repeatedly for the
    /// same type; the DDL is idempotent.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Dao<T>> {
        let schema = TableSchema::derive::<T>()?;
        let cache = {
            let guard = conn.lock().unwrap();
            let sql = schema.create_table_sql();
            debug!(table = %schema.table(), %sql, "registering entity");
            guard.execute(&sql, [])?;
            FieldCache::build(&guard, schema.table(), T::fields())?
        };
        Ok(Dao {
            conn,
            schema,
            cache,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Declared fields that were excluded from the table (no storage
    /// mapping). Exclusion is policy, not an error; this makes it observable.
    pub fn skipped_fields(&self) -> &[&'static str] {
        self.schema.skipped_fields()
    }

    /// Inserts a record, returning the engine-assigned row identifier.
    pub fn insert(&self, record: &T) -> Result<i64> {
        let values = self.to_value_map(record);
        let conn = self.conn.lock().unwrap();
        if values.is_empty() {
            conn.execute(
                &format!("INSERT INTO {} DEFAULT VALUES", self.schema.table()),
                [],
            )?;
        } else {
            let columns = values.keys().copied().collect::<Vec<_>>().join(", ");
            let placeholders = vec!["?"; values.len()].join(", ");
            let sql = format!(
                "INSERT INTO {}({}) VALUES({})",
                self.schema.table(),
                columns,
                placeholders
            );
            conn.execute(&sql, params_from_iter(values.values()))?;
        }
        Ok(conn.last_insert_rowid())
    }

    /// Updates rows matching `filter` with the populated fields of `record`,
    /// returning the affected-row count. An all-absent `record` sets nothing
    /// and reports 0 without touching the engine.
    pub fn update(&self, record: &T, filter: &T) -> Result<usize> {
        let values = self.to_value_map(record);
        if values.is_empty() {
            return Ok(0);
        }
        let condition = Condition::build(&self.to_value_map(filter));
        let assignments = values
            .keys()
            .map(|column| format!("{column}=?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.schema.table(),
            assignments,
            condition.clause()
        );
        let args = values
            .values()
            .cloned()
            .chain(condition.args().iter().cloned());
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(&sql, params_from_iter(args))?)
    }

    /// Deletes rows matching `filter`, returning the affected-row count. An
    /// all-absent filter intentionally matches every row.
    pub fn delete(&self, filter: &T) -> Result<usize> {
        let condition = Condition::build(&self.to_value_map(filter));
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.schema.table(),
            condition.clause()
        );
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(&sql, params_from_iter(condition.args()))?)
    }

    /// Equality-conjunction query with no ordering or paging.
    pub fn query(&self, filter: &T) -> Result<Vec<T>> {
        self.query_with(filter, &[], None, None)
    }

    /// Query with optional ordering and paging.
    ///
    /// `order_by` is `(column, ascending)` pairs; names that are not cached
    /// columns are skipped. Paging applies only when BOTH `offset` and
    /// `limit` are present. The result is fully materialized before
    /// returning; a row-level decode failure from the engine aborts the whole
    /// call rather than yielding a partial list.
    pub fn query_with(
        &self,
        filter: &T,
        order_by: &[(&str, bool)],
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<T>> {
        let condition = Condition::build(&self.to_value_map(filter));
        let mut sql = format!(
            "SELECT * FROM {} WHERE {}",
            self.schema.table(),
            condition.clause()
        );

        let order = order_by
            .iter()
            .filter(|&&(column, _)| {
                let known = self.cache.contains(column);
                if !known {
                    warn!(table = %self.schema.table(), column, "unknown order-by column skipped");
                }
                known
            })
            .map(|&(column, ascending)| {
                format!("{column} {}", if ascending { "ASC" } else { "DESC" })
            })
            .collect::<Vec<_>>();
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let (Some(offset), Some(limit)) = (offset, limit) {
            sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
        }

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt.query(params_from_iter(condition.args()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = T::default();
            for spec in self.cache.fields() {
                let Some(kind) = spec.kind() else { continue };
                let Some(index) = columns.iter().position(|c| c.as_str() == spec.column_name()) else {
                    continue;
                };
                let stored: rusqlite::types::Value = row.get(index)?;
                if let Some(value) = Value::from_stored(kind, stored) {
                    spec.write(&mut record, value);
                }
            }
            result.push(record);
        }
        Ok(result)
    }

    /// Reads the populated fields of a record into column order.
    ///
    /// Absent (`Null`) values are omitted entirely, never written as NULL. A
    /// value whose variant contradicts the field's declared kind is omitted
    /// too, with a warning; the operation proceeds with the rest.
    fn to_value_map(&self, record: &T) -> ValueMap {
        let mut map = ValueMap::new();
        for spec in self.cache.fields() {
            let Some(kind) = spec.kind() else { continue };
            let value = spec.read(record);
            if value.is_null() {
                continue;
            }
            if !value.matches(kind) {
                warn!(
                    table = %self.schema.table(),
                    field = spec.name(),
                    "field value does not match its declared kind; omitted"
                );
                continue;
            }
            map.insert(spec.column_name(), value);
        }
        map
    }
}

impl<T: Entity> std::fmt::Debug for Dao<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dao")
            .field("schema", &self.schema)
            .field("cache", &self.cache)
            .finish()
    }
}
