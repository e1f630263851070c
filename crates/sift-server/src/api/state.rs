//! API shared state

use std::sync::Arc;

use sift_core::SearchEngine;

/// Shared application state for the search API
///
/// The engine is immutable after startup, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

impl AppState {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self { engine }
    }
}
