//! Runtime configuration
//!
//! Read once at startup from `SIFT_*` environment variables (plus
//! `VOYAGE_API_KEY`). Required values fail fast; numeric knobs fall back to
//! their defaults with a warning.

use std::path::PathBuf;
use std::time::Duration;

use crate::embeddings::{DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL};
use crate::search::DEFAULT_CANDIDATE_POOL;

pub const DATABASE_PATH_VAR: &str = "SIFT_DATABASE_PATH";
pub const API_KEY_VAR: &str = "VOYAGE_API_KEY";
pub const TOKENIZER_PATH_VAR: &str = "SIFT_TOKENIZER_PATH";
pub const EMBEDDING_MODEL_VAR: &str = "SIFT_EMBEDDING_MODEL";
pub const EMBEDDING_URL_VAR: &str = "SIFT_EMBEDDING_URL";
pub const CANDIDATE_POOL_VAR: &str = "SIFT_CANDIDATE_POOL";
pub const EMBED_TIMEOUT_VAR: &str = "SIFT_EMBED_TIMEOUT_SECS";
pub const QUERY_TIMEOUT_VAR: &str = "SIFT_QUERY_TIMEOUT_SECS";

/// Default bound on the remote embedding call
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the storage query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Everything needed to build a search engine
#[derive(Clone)]
pub struct SearchConfig {
    pub database_path: PathBuf,
    pub api_key: String,
    pub tokenizer_path: PathBuf,
    pub embedding_model: String,
    pub embedding_url: String,
    pub candidate_pool: usize,
    pub embed_timeout: Duration,
    pub query_timeout: Duration,
}

impl SearchConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary lookup, so tests need not touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_path = PathBuf::from(required(DATABASE_PATH_VAR)?);
        let api_key = required(API_KEY_VAR)?;
        let tokenizer_path = PathBuf::from(required(TOKENIZER_PATH_VAR)?);

        let embedding_model = lookup(EMBEDDING_MODEL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let embedding_url = lookup(EMBEDDING_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_URL.to_string());

        let candidate_pool = parse_positive(
            CANDIDATE_POOL_VAR,
            lookup(CANDIDATE_POOL_VAR),
            DEFAULT_CANDIDATE_POOL as u64,
            u32::MAX as u64,
        ) as usize;
        let embed_timeout = Duration::from_secs(parse_positive(
            EMBED_TIMEOUT_VAR,
            lookup(EMBED_TIMEOUT_VAR),
            DEFAULT_EMBED_TIMEOUT.as_secs(),
            u64::MAX,
        ));
        let query_timeout = Duration::from_secs(parse_positive(
            QUERY_TIMEOUT_VAR,
            lookup(QUERY_TIMEOUT_VAR),
            DEFAULT_QUERY_TIMEOUT.as_secs(),
            u64::MAX,
        ));

        Ok(Self {
            database_path,
            api_key,
            tokenizer_path,
            embedding_model,
            embedding_url,
            candidate_pool,
            embed_timeout,
            query_timeout,
        })
    }
}

/// Parse an integer in `1..=max`, warning and falling back on anything else
fn parse_positive(name: &str, raw: Option<String>, default: u64, max: u64) -> u64 {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if (1..=max).contains(&value) => value,
            _ => {
                tracing::warn!(
                    "Invalid {}='{}', using default {}",
                    name,
                    raw,
                    default
                );
                default
            }
        },
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("database_path", &self.database_path)
            .field("api_key", &"<redacted>")
            .field("tokenizer_path", &self.tokenizer_path)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_url", &self.embedding_url)
            .field("candidate_pool", &self.candidate_pool)
            .field("embed_timeout", &self.embed_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}
