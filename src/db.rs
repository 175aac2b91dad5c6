use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::live::LiveQueries;

pub struct Database {
    pub conn: Mutex<Connection>,
    pub(crate) live: LiveQueries,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::info!("Opened database at {}", path.display());

        Ok(Database {
            conn: Mutex::new(conn),
            live: LiveQueries::default(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Database {
            conn: Mutex::new(Connection::open_in_memory()?),
            live: LiveQueries::default(),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Every collection shares one table; the body is the JSON document
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            ",
        )?;

        // Pass the held connection to avoid re-locking
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(documents)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !columns.contains(&"updated_at".to_string()) {
            tracing::info!("Adding updated_at column to documents");
            conn.execute("ALTER TABLE documents ADD COLUMN updated_at DATETIME", [])?;
        }

        Ok(())
    }
}

#[cfg(feature = "desktop")]
mod app {
    use super::Database;
    use crate::config::Config;
    use crate::error::{Error, Result};
    use tauri::{AppHandle, Manager};

    impl Database {
        /// Opens the configured database file, or `haccp.db` in the app data dir.
        pub fn for_app(app_handle: &AppHandle, config: &Config) -> Result<Self> {
            let path = match &config.database_path {
                Some(path) => path.clone(),
                None => {
                    let app_dir = app_handle
                        .path()
                        .app_data_dir()
                        .map_err(|e| Error::Runtime(e.to_string()))?;
                    std::fs::create_dir_all(&app_dir)?;
                    app_dir.join("haccp.db")
                }
            };

            Database::open(&path)
        }
    }

    pub trait DatabaseExt {
        fn db(&self) -> &Database;
    }

    impl DatabaseExt for AppHandle {
        fn db(&self) -> &Database {
            self.state::<Database>().inner()
        }
    }
}

#[cfg(feature = "desktop")]
pub use app::DatabaseExt;
