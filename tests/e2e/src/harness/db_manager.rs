//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Engines wired to mock encoders over that database
//! - Raw connections for breaking the store on purpose

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sift_core::storage::StorageConnection;
use sift_core::{DenseEncoder, EngineOptions, SearchEngine, SparseEncoder, Storage};
use tempfile::TempDir;

use crate::mocks::WordTokens;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// let engine = db.engine(Arc::new(HashingEncoder));
///
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// The storage handle
    pub storage: Storage,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: TempDir,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new, migrated test database in a temporary directory
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_sift.db");

        let storage = Storage::open(&db_path).expect("Failed to create test storage");

        Self {
            storage,
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Engine over this database with the word tokenizer and default options
    pub fn engine(&self, dense: Arc<dyn DenseEncoder>) -> SearchEngine {
        self.engine_with_options(dense, EngineOptions::default())
    }

    /// Engine over this database with explicit options
    pub fn engine_with_options(
        &self,
        dense: Arc<dyn DenseEncoder>,
        options: EngineOptions,
    ) -> SearchEngine {
        SearchEngine::new(
            dense,
            SparseEncoder::new(WordTokens),
            self.storage.clone(),
            options,
        )
    }

    /// A raw connection for direct inspection or sabotage
    pub fn connect(&self) -> StorageConnection {
        self.storage.connect().expect("Failed to connect to test storage")
    }

    /// Number of stored documents
    pub fn document_count(&self) -> u64 {
        self.storage.count_documents().expect("Failed to count documents")
    }
}
