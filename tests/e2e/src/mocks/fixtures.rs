//! Test Data Factory
//!
//! A small corpus of PubMed-style abstracts plus helpers to load it through
//! the engine (both encoders run, exactly as `sift ingest` does).

use serde_json::json;
use sift_core::{DocumentRecord, SearchEngine};

/// Eight short abstracts; five mention cancer and/or treatment
pub fn medical_abstracts() -> Vec<DocumentRecord> {
    let raw: [(&str, &str, &str, i64); 8] = [
        (
            "pm-1001",
            "Chemotherapy for breast cancer",
            "Adjuvant chemotherapy improves survival in early breast cancer. Cancer treatment \
             outcomes depend on tumor stage and treatment adherence.",
            2019,
        ),
        (
            "pm-1002",
            "Immunotherapy in lung cancer",
            "Checkpoint inhibitors changed lung cancer treatment for many patients.",
            2021,
        ),
        (
            "pm-1003",
            "Radiation dose planning",
            "Careful dose planning for prostate cancer radiation reduces toxicity.",
            2018,
        ),
        (
            "pm-1004",
            "Type 2 diabetes management",
            "Metformin remains the first line treatment for type 2 diabetes.",
            2020,
        ),
        (
            "pm-1005",
            "Hypertension in older adults",
            "Blood pressure targets in elderly patients with hypertension.",
            2017,
        ),
        (
            "pm-1006",
            "Antibiotic resistance surveillance",
            "Surveillance of antibiotic resistance in hospital acquired infections.",
            2022,
        ),
        (
            "pm-1007",
            "Sleep and memory",
            "Slow wave sleep supports memory consolidation in adults.",
            2016,
        ),
        (
            "pm-1008",
            "Exercise after cancer diagnosis",
            "Physical activity during cancer survivorship improves fatigue.",
            2023,
        ),
    ];

    raw.into_iter()
        .map(|(id, title, content, year)| DocumentRecord {
            doc_id: id.to_string(),
            title: Some(title.to_string()),
            content: content.to_string(),
            source: Some("pubmed".to_string()),
            metadata: Some(json!({ "year": year })),
        })
        .collect()
}

/// Loads fixture data through a search engine
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// let engine = db.engine(Arc::new(HashingEncoder));
/// TestDataFactory::load_medical_corpus(&engine).await;
/// ```
pub struct TestDataFactory;

impl TestDataFactory {
    /// Index every medical abstract; panics on failure
    pub async fn load_medical_corpus(engine: &SearchEngine) -> usize {
        let docs = medical_abstracts();
        for doc in &docs {
            engine
                .index_document(doc)
                .await
                .unwrap_or_else(|e| panic!("Failed to index {}: {}", doc.doc_id, e));
        }
        docs.len()
    }

    /// One JSONL line per abstract, as read by `sift ingest`
    pub fn medical_corpus_jsonl() -> String {
        medical_abstracts()
            .iter()
            .map(|doc| serde_json::to_string(doc).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
