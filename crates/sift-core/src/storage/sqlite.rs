//! SQLite Storage Implementation
//!
//! The document store holds no long-lived connection. Each search opens a
//! `StorageConnection`, which is closed when it goes out of scope, whether the
//! call succeeded or failed.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, Params};
use serde_json::Value;

use super::functions::register_vector_functions;
use super::migrations::apply_migrations;
use super::DocumentRecord;
use crate::embeddings::DenseVector;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error (connectivity, malformed query, operator failure)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Result row does not match the expected schema
    #[error("Unexpected row shape: {0}")]
    Schema(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// The caller stopped waiting before the next statement started
    #[error("Query cancelled")]
    Cancelled,
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// RAW ROWS
// ============================================================================

/// One result row as `(column name, value)` pairs in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<(String, Value)>,
}

impl RawRow {
    /// Build from column/value pairs
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value of a column, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Column names in select order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Consume into the column/value pairs
    pub fn into_columns(self) -> Vec<(String, Value)> {
        self.columns
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        // Vector payloads are dropped before results leave the crate
        ValueRef::Blob(_) => Value::Null,
    }
}

// ============================================================================
// SCOPED CONNECTION
// ============================================================================

/// Shared flag a waiting caller sets when it gives up on a connection
///
/// A cancelled connection refuses to start any further statement. Pair it with
/// `Connection::get_interrupt_handle` to also stop the one already running.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StorageError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A connection scoped to one search call
///
/// Dereferences to `rusqlite::Connection`; the vector operators are already
/// registered.
pub struct StorageConnection {
    conn: Connection,
    cancel: Cancellation,
    opened_at: Instant,
}

impl StorageConnection {
    /// Run a query and collect every row by column name
    pub fn query_rows<P: Params>(&self, sql: &str, params: P) -> Result<Vec<RawRow>> {
        self.cancel.check()?;
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                columns.push((name.clone(), to_json(row.get_ref(i)?)));
            }
            out.push(RawRow::new(columns));
        }

        Ok(out)
    }

    /// Run a `(doc_id, score)` query
    pub fn query_scores<P: Params>(&self, sql: &str, params: P) -> Result<Vec<(String, f64)>> {
        self.cancel.check()?;
        let mut stmt = self.conn.prepare(sql)?;
        let scores = stmt
            .query_map(params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(scores)
    }

    /// Fetch full document rows for a set of ids, in no particular order
    pub fn fetch_documents(&self, ids: &[String]) -> Result<Vec<RawRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT * FROM documents WHERE doc_id IN ({})", placeholders);

        self.query_rows(&sql, params_from_iter(ids.iter()))
    }
}

impl Deref for StorageConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for StorageConnection {
    fn drop(&mut self) {
        tracing::debug!(
            held_ms = self.opened_at.elapsed().as_millis() as u64,
            "Storage connection closed"
        );
    }
}

// ============================================================================
// STORAGE
// ============================================================================

/// Handle to the document store
///
/// Holds only the database path, so it is cheap to clone into blocking tasks.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Apply PRAGMAs and register the vector operators
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;

        register_vector_functions(conn)?;

        Ok(())
    }

    /// Open (creating if needed) the database and apply migrations
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StorageError::Init("Database path is empty".to_string()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        Self::configure_connection(&conn)?;

        let applied = apply_migrations(&conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %path.display(), "Database migrations applied");
        }

        Ok(Self { path })
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection for one call
    pub fn connect(&self) -> Result<StorageConnection> {
        self.connect_with(Cancellation::default())
    }

    /// Open a connection that stops issuing statements once `cancel` is set
    pub fn connect_with(&self, cancel: Cancellation) -> Result<StorageConnection> {
        let conn = Connection::open(&self.path)?;
        Self::configure_connection(&conn)?;
        cancel.check()?;
        tracing::debug!(path = %self.path.display(), "Storage connection opened");

        Ok(StorageConnection {
            conn,
            cancel,
            opened_at: Instant::now(),
        })
    }

    /// Insert or replace a document together with its vectors
    pub fn upsert_document(
        &self,
        doc: &DocumentRecord,
        embedding: &DenseVector,
        sparse_wire: &str,
        embedding_model: &str,
    ) -> Result<()> {
        let conn = self.connect()?;
        let metadata = doc.metadata.as_ref().map(|m| m.to_string());

        conn.execute(
            "INSERT INTO documents
                (doc_id, title, content, source, metadata, embedding, sparse, embedding_model)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(doc_id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                source = excluded.source,
                metadata = excluded.metadata,
                embedding = excluded.embedding,
                sparse = excluded.sparse,
                embedding_model = excluded.embedding_model,
                updated_at = datetime('now')",
            params![
                doc.doc_id,
                doc.title,
                doc.content,
                doc.source,
                metadata,
                embedding.to_bytes(),
                sparse_wire,
                embedding_model,
            ],
        )?;

        Ok(())
    }

    /// Number of stored documents
    pub fn count_documents(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

// ============================================================================
// TESTS
// ============================================================================
