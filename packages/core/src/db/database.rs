//! Database Connection Management
//!
//! Core connection and initialization for the Teamboard schema.
//!
//! # Connection Patterns
//!
//! Always use `connect_with_timeout()` in async functions. The Tokio runtime
//! moves futures between threads at `.await` points, and the 5-second busy
//! timeout lets concurrent operations wait and retry instead of failing
//! immediately with `SQLITE_BUSY`. The helper also enables foreign key
//! enforcement, which SQLite scopes per connection and which the cascade
//! rules of the schema depend on.
//!
//! # Schema
//!
//! - `projects`, `team_members`, `tasks`, `project_members` - relational
//!   entity state with cascade/set-null foreign keys
//! - `mindmap_nodes`, `mindmap_connections` - the derived graph, cleared and
//!   rebuilt atomically on every synchronization pass

use crate::db::error::DatabaseError;
use libsql::Builder;
use std::path::PathBuf;
use std::sync::Arc;

/// Database service managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use teamboard_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("./data/teamboard.db")).await?;
///     let conn = db.connect_with_timeout().await?;
///     # let _ = conn;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<libsql::Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// Ensures the parent directory exists, opens or creates the database
    /// file, and initializes the schema idempotently.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// connection fails, or schema initialization fails.
    pub async fn new(db_path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let db_path = db_path.into();
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so query() must be used instead of
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Creates tables and indexes using CREATE TABLE IF NOT EXISTS, so
    /// initialization is safe to run multiple times.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        // WAL mode for better concurrency
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT '#7c5cff',
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create projects table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS team_members (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                avatar TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL DEFAULT '#4f8cff',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create team_members table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium'
                    CHECK (priority IN ('low', 'medium', 'high')),
                deadline TEXT NOT NULL,
                project_id TEXT NOT NULL,
                assigned_to TEXT,
                tech_stack TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                -- Project deletion cascades to its tasks
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                -- Member deletion keeps the task but clears the assignment
                FOREIGN KEY (assigned_to) REFERENCES team_members(id) ON DELETE SET NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create tasks table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS project_members (
                project_id TEXT NOT NULL,
                member_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (project_id, member_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (member_id) REFERENCES team_members(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create project_members table: {}", e))
        })?;

        // Derived graph tables. Ids are dense integers assigned by the
        // synchronizer, regenerated from 0 on every pass.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS mindmap_nodes (
                id INTEGER PRIMARY KEY,
                x REAL NOT NULL,
                y REAL NOT NULL,
                text TEXT NOT NULL,
                level INTEGER NOT NULL,
                entity_type TEXT,
                entity_id TEXT
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create mindmap_nodes table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS mindmap_connections (
                id INTEGER PRIMARY KEY,
                from_node INTEGER NOT NULL,
                to_node INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create mindmap_connections table: {}",
                e
            ))
        })?;

        self.create_indexes(&conn).await?;

        Ok(())
    }

    /// Create indexes for the entity tables
    async fn create_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        // Tasks are enumerated per project on every sync pass
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create index 'idx_tasks_project': {}", e))
        })?;

        // Workload lookups filter by assignee
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_assigned ON tasks(assigned_to)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_tasks_assigned': {}",
                e
            ))
        })?;

        // Reverse lookup when cascading member deletes
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_project_members_member
             ON project_members(member_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_project_members_member': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a synchronous connection to the database
    ///
    /// Only use this in synchronous, single-threaded contexts. Async code
    /// should use `connect_with_timeout()` instead.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout and foreign keys configured
    ///
    /// This is the safe default for all async code. The busy timeout makes
    /// concurrent operations wait up to 5 seconds instead of failing with
    /// `SQLITE_BUSY`, and foreign key enforcement is enabled per connection
    /// because the cascade rules of the schema rely on it.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }
}
