//! Search Orchestrator
//!
//! validate -> combine queries -> dense + sparse encoding (concurrently) ->
//! plan execution on a scoped connection -> normalization.
//!
//! The engine holds only immutable collaborators, so one instance is shared
//! across concurrent calls behind an `Arc`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use super::error::{IndexError, SearchError, Stage};
use super::fusion::DEFAULT_CANDIDATE_POOL;
use super::planner::QueryPlan;
use super::request::{SearchMode, SearchParams, SearchRequest};
use super::results::{normalize_rows, SearchResult};
use crate::config::{SearchConfig, DEFAULT_EMBED_TIMEOUT, DEFAULT_QUERY_TIMEOUT};
use crate::embeddings::{DenseEncoder, DenseVector, EmbeddingError, SparseEncoder, SparseVector};
use crate::storage::{Cancellation, DocumentRecord, RawRow, Storage, StorageError};

/// Tunables that are not part of a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Size of each hybrid candidate pool
    pub candidate_pool: usize,
    /// Bound on the remote dense encoding call
    pub embed_timeout: Duration,
    /// Bound on the storage query
    pub query_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl From<&SearchConfig> for EngineOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            candidate_pool: config.candidate_pool,
            embed_timeout: config.embed_timeout,
            query_timeout: config.query_timeout,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Hybrid retrieval engine
pub struct SearchEngine {
    dense: Arc<dyn DenseEncoder>,
    sparse: SparseEncoder,
    storage: Storage,
    options: EngineOptions,
}

impl SearchEngine {
    /// Assemble an engine from already-built collaborators
    pub fn new(
        dense: Arc<dyn DenseEncoder>,
        sparse: SparseEncoder,
        storage: Storage,
        options: EngineOptions,
    ) -> Self {
        Self {
            dense,
            sparse,
            storage,
            options,
        }
    }

    /// Build the production engine: Voyage AI dense encoder, HuggingFace
    /// tokenizer and the SQLite store
    #[cfg(feature = "remote-embeddings")]
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let dense = crate::embeddings::VoyageEncoder::new(
            config.api_key.clone(),
            config.embedding_model.clone(),
            &config.embedding_url,
        )
        .map_err(|e| SearchError::Init(e.to_string()))?;

        let sparse = SparseEncoder::from_tokenizer_file(&config.tokenizer_path)
            .map_err(|e| SearchError::Init(e.to_string()))?;

        let storage = Storage::open(&config.database_path).map_err(|e| {
            SearchError::Init(format!(
                "Failed to open database {}: {}",
                config.database_path.display(),
                e
            ))
        })?;

        tracing::info!(
            model = %config.embedding_model,
            vocab_size = sparse.vocab_size(),
            candidate_pool = config.candidate_pool,
            "Search engine initialized"
        );

        Ok(Self::new(
            Arc::new(dense),
            sparse,
            storage,
            EngineOptions::from(config),
        ))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Dense model identifier
    pub fn model_name(&self) -> &str {
        self.dense.model_name()
    }

    /// Validate wire params, then search
    pub async fn search_params(&self, params: SearchParams) -> Result<SearchResult, SearchError> {
        let request = SearchRequest::try_from(params).inspect_err(|e| {
            tracing::warn!(error = %e, "Search request rejected");
        })?;
        self.search(&request).await
    }

    /// Run one search
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let started = Instant::now();
        let mode = request.mode();

        let outcome = self.run(request).await;
        let duration_ms = millis(started.elapsed());

        match &outcome {
            Ok(result) => tracing::info!(
                mode = %mode,
                top_k = request.top_k(),
                alpha = ?request.alpha(),
                duration_ms,
                total_found = result.total_found,
                "Search completed"
            ),
            Err(e) => tracing::error!(
                mode = %mode,
                top_k = request.top_k(),
                stage = ?e.stage(),
                duration_ms,
                error = %e,
                "Search failed"
            ),
        }

        outcome
    }

    async fn run(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let mode = request.mode();
        let text = request.combined_query();

        let (dense, sparse) = self.encode(&text, mode).await?;
        let sparse_wire = sparse.to_wire(self.sparse.vocab_size());

        let plan = QueryPlan::new(
            request.retrieval(),
            request.top_k(),
            dense,
            sparse_wire,
            self.options.candidate_pool,
        );

        let rows = self.execute(plan).await?;
        let results =
            normalize_rows(rows).map_err(|source| SearchError::Storage { mode, source })?;

        Ok(SearchResult::new(results))
    }

    /// Dense and sparse encodings of one text, computed concurrently
    async fn encode(
        &self,
        text: &str,
        mode: SearchMode,
    ) -> Result<(DenseVector, SparseVector), SearchError> {
        let dense = async {
            match tokio::time::timeout(self.options.embed_timeout, self.dense.embed(text)).await {
                Ok(embedded) => embedded.map_err(|source| SearchError::Encoding {
                    mode,
                    stage: Stage::DenseEncoding,
                    source,
                }),
                Err(_) => Err(SearchError::Timeout {
                    mode,
                    stage: Stage::DenseEncoding,
                    timeout_ms: millis(self.options.embed_timeout),
                }),
            }
        };

        let sparse = async {
            self.encode_sparse(text)
                .await
                .map_err(|source| SearchError::Encoding {
                    mode,
                    stage: Stage::SparseEncoding,
                    source,
                })
        };

        let (dense, sparse) = tokio::join!(dense, sparse);
        Ok((dense?, sparse?))
    }

    /// Tokenization is CPU-bound, so it runs on the blocking pool
    async fn encode_sparse(&self, text: &str) -> Result<SparseVector, EmbeddingError> {
        let encoder = self.sparse.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || encoder.encode(&text))
            .await
            .map_err(|e| EmbeddingError::TokenizationFailed(format!("Tokenizer task failed: {}", e)))?
    }

    /// Execute a plan on a connection scoped to this call
    ///
    /// On timeout the connection is cancelled, so no further statement starts,
    /// and the running one is interrupted. The connection is dropped when the
    /// blocking task returns.
    async fn execute(&self, plan: QueryPlan) -> Result<Vec<RawRow>, SearchError> {
        let mode = plan.mode();
        let storage = self.storage.clone();
        let cancel = Cancellation::default();
        let task_cancel = cancel.clone();
        let (handle_tx, mut handle_rx) = oneshot::channel();

        // the handle is sent before the first statement checks the flag, and
        // the flag is set before the handle is looked for
        let task = tokio::task::spawn_blocking(move || -> Result<Vec<RawRow>, StorageError> {
            let conn = storage.connect_with(task_cancel)?;
            let _ = handle_tx.send(conn.get_interrupt_handle());
            plan.execute(&conn)
        });

        match tokio::time::timeout(self.options.query_timeout, task).await {
            Ok(Ok(rows)) => rows.map_err(|source| SearchError::Storage { mode, source }),
            Ok(Err(join)) => Err(SearchError::Storage {
                mode,
                source: StorageError::Io(std::io::Error::other(format!(
                    "Storage task failed: {}",
                    join
                ))),
            }),
            Err(_) => {
                cancel.cancel();
                if let Ok(handle) = handle_rx.try_recv() {
                    handle.interrupt();
                }
                Err(SearchError::Timeout {
                    mode,
                    stage: Stage::Storage,
                    timeout_ms: millis(self.options.query_timeout),
                })
            }
        }
    }

    /// Encode a document with both encoders and upsert it
    pub async fn index_document(&self, doc: &DocumentRecord) -> Result<(), IndexError> {
        if doc.doc_id.trim().is_empty() {
            return Err(IndexError::InvalidDocument {
                doc_id: doc.doc_id.clone(),
                reason: "empty doc_id".to_string(),
            });
        }
        let text = doc.encoding_text();
        if text.trim().is_empty() {
            return Err(IndexError::InvalidDocument {
                doc_id: doc.doc_id.clone(),
                reason: "no text to encode".to_string(),
            });
        }

        let dense = async {
            match tokio::time::timeout(self.options.embed_timeout, self.dense.embed(&text)).await {
                Ok(embedded) => embedded.map_err(|source| IndexError::Encoding {
                    doc_id: doc.doc_id.clone(),
                    stage: Stage::DenseEncoding,
                    source,
                }),
                Err(_) => Err(IndexError::Timeout {
                    doc_id: doc.doc_id.clone(),
                    timeout_ms: millis(self.options.embed_timeout),
                }),
            }
        };
        let sparse = async {
            self.encode_sparse(&text)
                .await
                .map_err(|source| IndexError::Encoding {
                    doc_id: doc.doc_id.clone(),
                    stage: Stage::SparseEncoding,
                    source,
                })
        };
        let (dense, sparse) = tokio::join!(dense, sparse);
        let (dense, sparse) = (dense?, sparse?);

        let sparse_wire = sparse.to_wire(self.sparse.vocab_size());
        let storage = self.storage.clone();
        let record = doc.clone();
        let model = self.dense.model_name().to_string();

        tokio::task::spawn_blocking(move || {
            storage.upsert_document(&record, &dense, &sparse_wire, &model)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(format!("Storage task failed: {}", e))))
        .and_then(|stored| stored)
        .map_err(|source| IndexError::Storage {
            doc_id: doc.doc_id.clone(),
            source,
        })?;

        tracing::debug!(doc_id = %doc.doc_id, terms = sparse.len(), "Document indexed");
        Ok(())
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("model", &self.dense.model_name())
            .field("sparse", &self.sparse)
            .field("storage", &self.storage)
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
