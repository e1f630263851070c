//! Sift Server
//!
//! HTTP search service over the Sift retrieval engine. The `sift` binary
//! wraps it together with one-shot `search` and `ingest` commands.

pub mod api;
