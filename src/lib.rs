//! Generic object mapper and DAO layer for SQLite.
//!
//! # Intention
//!
//! - Persist plain data types into SQLite without hand-written SQL: register
//!   a type once, get create-table, insert, update, delete and filtered
//!   query operations derived from its field descriptors.
//! - Keep all values out of statement text; parameters are always bound.
//!
//! # Architectural Boundaries
//!
//! - The crate receives an already-open [`rusqlite::Connection`]; it never
//!   opens, closes, or pools connections.
//! - Filters are equality conjunctions only. No joins, transactions,
//!   migrations, or schema evolution.

pub mod cache;
pub mod condition;
pub mod dao;
pub mod error;
pub mod registry;
pub mod schema;
pub mod value;

pub use cache::FieldCache;
pub use condition::Condition;
pub use dao::Dao;
pub use error::{DbError, Result};
pub use registry::Database;
pub use schema::{ColumnDef, DataType, Entity, FieldSpec, TableSchema};
pub use value::{Value, ValueMap};
