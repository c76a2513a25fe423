use crate::{Error, Result};
use rusqlite::Connection as SqliteConnection;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type Connection = SqliteConnection;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database manager for the tsundoku backend.
///
/// Cheap to clone; every operation opens its own connection so that work can
/// run on any thread of the blocking pool.
#[derive(Debug, Clone)]
pub struct Database {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Create a new database manager
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// How long a connection waits on SQLite's write lock before reporting busy.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Get a connection to the database
    pub fn connect(&self) -> Result<Connection> {
        let conn = SqliteConnection::open(&self.db_path)?;
        self.configure(&conn)?;
        Ok(conn)
    }

    /// Create a new database and initialize it with the schema
    pub fn create(&self) -> Result<Connection> {
        // Ensure parent directory exists
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = SqliteConnection::open(&self.db_path)?;
        self.configure(&conn)?;
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;

        self.initialize_schema(&conn)?;

        tracing::info!(path = %self.db_path.display(), "database schema initialized");
        Ok(conn)
    }

    fn configure(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(())
    }

    /// Initialize the database schema. Safe to run against an existing database.
    fn initialize_schema(&self, conn: &Connection) -> Result<()> {
        let schema = include_str!("../../schema.sql");
        conn.execute_batch(schema)?;
        Ok(())
    }

    /// Check if the database exists
    pub fn exists(&self) -> bool {
        self.db_path.exists()
    }

    /// Get or create a database connection
    pub fn get_or_create(&self) -> Result<Connection> {
        if self.exists() {
            self.connect()
        } else {
            self.create()
        }
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get the current schema version
    pub fn get_schema_version(&self, conn: &Connection) -> Result<i32> {
        let version: String = conn.query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )?;

        version
            .parse::<i32>()
            .map_err(|_| Error::Validation("Invalid schema version".to_string()))
    }

    /// Backup the database into a standalone file.
    ///
    /// Uses `VACUUM INTO`, which reads a consistent snapshot even while the
    /// server is writing in WAL mode.
    pub fn backup<P: AsRef<Path>>(&self, backup_path: P) -> Result<()> {
        let backup_path = backup_path.as_ref();
        if backup_path.exists() {
            return Err(Error::Conflict(format!(
                "backup target already exists: {}",
                backup_path.display()
            )));
        }
        let conn = self.connect()?;
        conn.execute("VACUUM INTO ?1", [backup_path.to_string_lossy().as_ref()])?;
        Ok(())
    }
}
