//! One-time column ↔ field association per registered type.

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::schema::{Entity, FieldSpec};

/// Memoized mapping from live table columns to field descriptors.
///
/// The live column set comes from the engine, not the derived schema: a
/// zero-row structural probe is prepared and its reported column names taken
/// as the source of truth, guarding against engine-side name normalization
/// and pre-existing tables with extra columns. Immutable once built, so
/// concurrent readers need no synchronization.
pub struct FieldCache<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T: Entity> FieldCache<T> {
    /// Builds the cache against an already-created table.
    pub fn build(conn: &Connection, table: &str, specs: Vec<FieldSpec<T>>) -> Result<FieldCache<T>> {
        let stmt = conn.prepare(&format!("SELECT * FROM {table} LIMIT 0"))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        drop(stmt);

        let mut pool: Vec<Option<FieldSpec<T>>> = specs.into_iter().map(Some).collect();
        let mut fields = Vec::with_capacity(columns.len());
        for column in &columns {
            let matched = pool.iter_mut().find(|slot| {
                slot.as_ref().is_some_and(|spec| {
                    spec.kind().is_some() && spec.column_name() == column.as_str()
                })
            });
            match matched.and_then(Option::take) {
                Some(spec) => fields.push(spec),
                // Engine columns with no descriptor stay invisible to all
                // later reads and writes.
                None => debug!(table, column = %column, "column has no matching field; dropped from cache"),
            }
        }
        Ok(FieldCache { fields })
    }

    /// Cached field descriptors, in the engine-reported column order.
    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a column survived the probe and has a field accessor.
    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|spec| spec.column_name() == column)
    }
}

impl<T> std::fmt::Debug for FieldCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCache").field("fields", &self.fields).finish()
    }
}
