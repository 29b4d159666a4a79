//! SQLite Database Handle
//! Mission: One shared connection and schema for identities and owned records
//!
//! # Schema Design
//!
//! ```sql
//! CREATE TABLE identities (id TEXT PRIMARY KEY, email TEXT UNIQUE, secret_hash TEXT, created_at TEXT);
//! CREATE TABLE classes    (id TEXT PRIMARY KEY, name TEXT, subject TEXT, user_id TEXT);
//! CREATE TABLE teachers   (id TEXT PRIMARY KEY, name TEXT, subject TEXT, user_id TEXT);
//! CREATE TABLE students   (id TEXT PRIMARY KEY, name TEXT, admission_no TEXT UNIQUE,
//!                          class_label TEXT, attendance_percentage REAL, user_id TEXT);
//! CREATE TABLE attendance (id TEXT PRIMARY KEY, student_id TEXT, date TEXT, status TEXT, user_id TEXT);
//! ```
//!
//! `attendance.student_id` deliberately carries no foreign key: deleting a student leaves
//! its attendance rows behind.

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Schema version for migrations.
/// Version history:
/// - v1: Initial schema
const SCHEMA_VERSION: u32 = 1;

/// Shared SQLite connection. Cloning shares the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Lock the connection for the duration of one operation.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        let current_version: Option<u32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match current_version {
            None => {
                create_schema_v1(&conn).context("create schema")?;
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )?;
                info!("🗄️  Created database schema v{}", SCHEMA_VERSION);
            }
            Some(v) if v == SCHEMA_VERSION => {
                debug!("Database schema at v{}", SCHEMA_VERSION);
            }
            Some(v) => {
                warn!(
                    "Database schema version mismatch: expected {}, got {}",
                    SCHEMA_VERSION, v
                );
            }
        }

        Ok(())
    }
}

/// Read a TEXT column holding a UUID.
pub fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<uuid::Uuid> {
    let raw: String = row.get(idx)?;
    uuid::Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// True when a statement failed on a UNIQUE constraint.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn create_schema_v1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            secret_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS classes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            subject TEXT NOT NULL,
            user_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_classes_user ON classes(user_id);

        CREATE TABLE IF NOT EXISTS teachers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            subject TEXT NOT NULL,
            user_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_teachers_user ON teachers(user_id);

        CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            admission_no TEXT UNIQUE NOT NULL,
            class_label TEXT NOT NULL,
            attendance_percentage REAL NOT NULL DEFAULT 0
                CHECK (attendance_percentage >= 0 AND attendance_percentage <= 100),
            user_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_students_user ON students(user_id);

        CREATE TABLE IF NOT EXISTS attendance (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('Present', 'Absent')),
            user_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_attendance_user ON attendance(user_id);
        "#,
    )
}
