//! Dense Embeddings
//!
//! Query-side dense encoding through a remote embedding service.
//!
//! The encoder is an object-safe async trait so the orchestrator can hold
//! `Arc<dyn DenseEncoder>`; the production implementation calls the Voyage AI
//! contextualized embeddings endpoint with a batch of one document-type input.

use async_trait::async_trait;

use super::EmbeddingError;

// ============================================================================
// DENSE VECTOR
// ============================================================================

/// A dense embedding vector
///
/// Dimensionality is whatever the model returns; it is not validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseVector {
    values: Vec<f32>,
}

impl DenseVector {
    /// Create a new dense vector
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Number of dimensions
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Borrow the raw values
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Consume into the raw values
    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }

    /// Convert to little-endian bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Create from little-endian bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Some(Self::new(values))
    }
}

impl From<Vec<f32>> for DenseVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

// ============================================================================
// VECTOR MATH
// ============================================================================

/// Cosine similarity between two vectors
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 { dot / denom } else { 0.0 }
}

/// Cosine distance (`1 - cosine_similarity`), the pgvector `<=>` operator
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Dot product of two vectors
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// ============================================================================
// ENCODER TRAIT
// ============================================================================

/// Produces one dense embedding per text
///
/// Implementations must be safe to call concurrently. Failures are final:
/// the orchestrator does not retry.
#[async_trait]
pub trait DenseEncoder: Send + Sync {
    /// Embed a single text as a document-type input
    async fn embed(&self, text: &str) -> Result<DenseVector, EmbeddingError>;

    /// Model identifier, for logs and health reporting
    fn model_name(&self) -> &str;
}

// ============================================================================
// VOYAGE AI
// ============================================================================

/// Default contextualized embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "voyage-context-3";

/// Default API base URL
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.voyageai.com/v1";

#[cfg(feature = "remote-embeddings")]
#[derive(Debug, serde::Serialize)]
struct ContextualizedRequest<'a> {
    /// One document made of one chunk
    inputs: Vec<Vec<&'a str>>,
    model: &'a str,
    input_type: &'static str,
}

#[cfg(feature = "remote-embeddings")]
#[derive(Debug, serde::Deserialize)]
struct ContextualizedResponse {
    data: Vec<ContextualizedDocument>,
}

#[cfg(feature = "remote-embeddings")]
#[derive(Debug, serde::Deserialize)]
struct ContextualizedDocument {
    data: Vec<ChunkEmbedding>,
}

#[cfg(feature = "remote-embeddings")]
#[derive(Debug, serde::Deserialize)]
struct ChunkEmbedding {
    embedding: Vec<f32>,
}

#[cfg(feature = "remote-embeddings")]
impl ContextualizedResponse {
    /// First embedding of the first result
    fn into_first_embedding(self) -> Result<DenseVector, EmbeddingError> {
        self.data
            .into_iter()
            .next()
            .and_then(|doc| doc.data.into_iter().next())
            .map(|chunk| DenseVector::new(chunk.embedding))
            .ok_or_else(|| {
                EmbeddingError::EmbeddingFailed("Response contained no embeddings".to_string())
            })
    }
}

/// Dense encoder backed by the Voyage AI contextualized embeddings API
///
/// Built once at startup and shared; the underlying `reqwest::Client` pools
/// connections across calls.
#[cfg(feature = "remote-embeddings")]
pub struct VoyageEncoder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[cfg(feature = "remote-embeddings")]
impl VoyageEncoder {
    /// Create an encoder for `model` at `base_url`
    ///
    /// Fails fast on an empty API key so a misconfigured service never
    /// becomes ready.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, EmbeddingError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::ModelInit(
                "Voyage API key is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("sift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EmbeddingError::ModelInit(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            endpoint: format!("{}/contextualizedembeddings", base_url.trim_end_matches('/')),
        })
    }
}

#[cfg(feature = "remote-embeddings")]
impl std::fmt::Debug for VoyageEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoyageEncoder")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "remote-embeddings")]
#[async_trait]
impl DenseEncoder for VoyageEncoder {
    async fn embed(&self, text: &str) -> Result<DenseVector, EmbeddingError> {
        tracing::debug!(model = %self.model, chars = text.len(), "Requesting dense embedding");

        let request = ContextualizedRequest {
            inputs: vec![vec![text]],
            model: &self.model,
            input_type: "document",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::EmbeddingFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "Embedding service returned {}: {}",
                status, body
            )));
        }

        let parsed: ContextualizedResponse = response.json().await.map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Malformed embedding response: {}", e))
        })?;

        let embedding = parsed.into_first_embedding()?;
        tracing::debug!(dimensions = embedding.dimensions(), "Dense embedding generated");
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// TESTS
// ============================================================================
