//! Document input records

use serde::{Deserialize, Serialize};

/// A document to load into the store
///
/// One JSON object per line in `sift ingest` files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable identifier (e.g. a PubMed id)
    pub doc_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    /// Arbitrary metadata, stored as JSON text
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl DocumentRecord {
    /// Text both encoders see: title and content separated by a blank line
    pub fn encoding_text(&self) -> String {
        match self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => format!("{}\n\n{}", title, self.content),
            None => self.content.clone(),
        }
    }
}
