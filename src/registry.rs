//! Mapper registry owning the shared connection.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::dao::Dao;
use crate::error::Result;
use crate::schema::Entity;

/// Explicit registry for DAOs, constructed once at startup from an
/// already-open connection and passed by reference to call sites.
///
/// One [`Dao`] is built per entity type on first request and memoized for the
/// registry's lifetime; the interior lock covers lookup-or-build, so
/// concurrent first registrations of the same type cannot issue duplicate DDL
/// or build the field cache twice.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    daos: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Database {
    /// Wraps an already-open handle. The registry never opens or closes
    /// connections itself.
    pub fn new(conn: Connection) -> Database {
        Database {
            conn: Arc::new(Mutex::new(conn)),
            daos: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the DAO for `T`, registering the type on first use.
    ///
    /// Repeated calls for the same type return the memoized DAO untouched.
    pub fn dao<T: Entity>(&self) -> Result<Arc<Dao<T>>> {
        let mut daos = self.daos.lock().unwrap();
        if let Some(existing) = daos.get(&TypeId::of::<T>()) {
            let dao = existing
                .clone()
                .downcast::<Dao<T>>()
                .expect("dao map entry registered under a foreign TypeId");
            return Ok(dao);
        }
        let dao = Arc::new(Dao::<T>::new(self.conn.clone())?);
        daos.insert(TypeId::of::<T>(), dao.clone());
        Ok(dao)
    }

    /// The shared handle, for callers that need raw statements alongside the
    /// mapper.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self.daos.lock().map(|daos| daos.len()).unwrap_or(0);
        f.debug_struct("Database")
            .field("registered_types", &registered)
            .finish()
    }
}
