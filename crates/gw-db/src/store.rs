use crate::activity_repo::ActivityRepo;
use crate::api_key_repo::ApiKeyRepo;
use crate::schema;
use crate::server_repo::ServerRepo;
use crate::team_repo::TeamRepo;
use crate::util::map_err;
use gw_core::GatewayError;
use gw_core::store::{Store, StoreProvider};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for DbStore {
    type Teams<'a>
        = TeamRepo<'a>
    where
        Self: 'a;
    type Servers<'a>
        = ServerRepo<'a>
    where
        Self: 'a;
    type Activity<'a>
        = ActivityRepo<'a>
    where
        Self: 'a;
    type ApiKeys<'a>
        = ApiKeyRepo<'a>
    where
        Self: 'a;

    fn teams(&self) -> Self::Teams<'_> {
        TeamRepo::new(&self.conn)
    }

    fn servers(&self) -> Self::Servers<'_> {
        ServerRepo::new(&self.conn)
    }

    fn activity(&self) -> Self::Activity<'_> {
        ActivityRepo::new(&self.conn)
    }

    fn api_keys(&self) -> Self::ApiKeys<'_> {
        ApiKeyRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&Self) -> Result<T, GatewayError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(map_err)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(map_err)?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").map_err(map_err)?;
                Err(err)
            }
        }
    }
}

/// Opens a fresh SQLite connection per store handle.
#[derive(Debug, Clone)]
pub struct DbProvider {
    path: Arc<PathBuf>,
}

impl DbProvider {
    /// Creates the database file if needed and applies the schema.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref().to_path_buf();
        let conn = schema::open(&path.to_string_lossy()).map_err(map_err)?;
        schema::migrate(&conn).map_err(map_err)?;
        tracing::debug!(path = %path.display(), "database ready");
        Ok(Self {
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreProvider for DbProvider {
    type Store = DbStore;

    fn open(&self) -> Result<DbStore, GatewayError> {
        let conn = schema::open(&self.path.to_string_lossy()).map_err(map_err)?;
        Ok(DbStore::new(conn))
    }
}
