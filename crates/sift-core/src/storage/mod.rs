//! Storage Module
//!
//! SQLite-backed document store with:
//! - Dense embeddings as packed f32 BLOBs, sparse vectors in wire format
//! - `cosine_distance` / `sparse_neg_inner_product` SQL operators
//! - Per-call scoped connections released on every exit path

mod document;
mod functions;
mod migrations;
mod sqlite;

pub use document::DocumentRecord;
pub use functions::{register_vector_functions, COSINE_DISTANCE_FN, SPARSE_NEG_INNER_PRODUCT_FN};
pub use migrations::MIGRATIONS;
pub use sqlite::{Cancellation, RawRow, Result, Storage, StorageConnection, StorageError};
