//! Journey: the three ranking modes over a loaded corpus

use std::sync::Arc;

use sift_core::{SearchEngine, SearchMode, SearchRequest, SearchResult};
use sift_e2e_tests::harness::TestDatabaseManager;
use sift_e2e_tests::mocks::{HashingEncoder, TestDataFactory};

async fn loaded() -> (TestDatabaseManager, SearchEngine) {
    let db = TestDatabaseManager::new_temp();
    let engine = db.engine(Arc::new(HashingEncoder));
    TestDataFactory::load_medical_corpus(&engine).await;
    (db, engine)
}

async fn run(
    engine: &SearchEngine,
    queries: &[&str],
    mode: SearchMode,
    top_k: i64,
    alpha: Option<f64>,
) -> SearchResult {
    let request = SearchRequest::new(queries.iter().copied(), mode, top_k, alpha).unwrap();
    engine.search(&request).await.unwrap()
}

fn ids(result: &SearchResult) -> Vec<&str> {
    result.results.iter().map(|d| d.doc_id.as_str()).collect()
}

#[tokio::test]
async fn test_statistical_cancer_treatment() {
    let (_db, engine) = loaded().await;

    let result = run(&engine, &["cancer treatment"], SearchMode::Statistical, 3, None).await;

    assert_eq!(result.results.len(), 3);
    assert_eq!(result.total_found, 3);
    // lower negative inner product is more relevant
    for pair in result.results.windows(2) {
        assert!(pair[0].similarity <= pair[1].similarity);
    }
    // 3x cancer + 2x treatment
    assert_eq!(result.results[0].doc_id, "pm-1001");
    assert_eq!(result.results[0].similarity, -5.0);
}

#[tokio::test]
async fn test_semantic_descending() {
    let (_db, engine) = loaded().await;

    let result = run(&engine, &["lung cancer immunotherapy"], SearchMode::Semantic, 5, None).await;

    assert_eq!(result.total_found, 5);
    for pair in result.results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
    assert_eq!(result.results[0].doc_id, "pm-1002");
    assert!(result.results[0].similarity <= 1.0 + 1e-6);
}

#[tokio::test]
async fn test_results_never_leak_payloads() {
    let (_db, engine) = loaded().await;

    for (mode, alpha) in [
        (SearchMode::Semantic, None),
        (SearchMode::Statistical, None),
        (SearchMode::Hybrid, Some(0.5)),
    ] {
        let result = run(&engine, &["cancer"], mode, 4, alpha).await;
        for doc in &result.results {
            let json = serde_json::to_value(doc).unwrap();
            let object = json.as_object().unwrap();
            assert!(object.contains_key("similarity"), "{mode}");
            assert!(!object.contains_key("embedding"), "{mode}");
            assert!(!object.contains_key("sparse"), "{mode}");
            assert!(!object.contains_key("score"), "{mode}");
            assert!(!object.contains_key("final_score"), "{mode}");
            assert_eq!(object.get("source"), Some(&serde_json::json!("pubmed")));
            assert!(object.get("metadata").and_then(|m| m.get("year")).is_some());
        }
    }
}

#[tokio::test]
async fn test_hybrid_alpha_one_matches_semantic() {
    let (_db, engine) = loaded().await;
    let queries = ["cancer treatment outcomes"];

    let semantic = run(&engine, &queries, SearchMode::Semantic, 5, None).await;
    let hybrid = run(&engine, &queries, SearchMode::Hybrid, 5, Some(1.0)).await;

    assert_eq!(ids(&hybrid), ids(&semantic));
    for (h, s) in hybrid.results.iter().zip(&semantic.results) {
        assert!((h.similarity - s.similarity).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_hybrid_alpha_zero_matches_statistical() {
    let (_db, engine) = loaded().await;
    let queries = ["cancer treatment"];

    let statistical = run(&engine, &queries, SearchMode::Statistical, 5, None).await;
    let hybrid = run(&engine, &queries, SearchMode::Hybrid, 5, Some(0.0)).await;

    assert_eq!(ids(&hybrid), ids(&statistical));
    // best lexical match is fully relevant after normalization
    assert_eq!(hybrid.results[0].similarity, 1.0);
}

#[tokio::test]
async fn test_hybrid_scores_bounded_and_descending() {
    let (_db, engine) = loaded().await;

    let result = run(&engine, &["cancer", "survival"], SearchMode::Hybrid, 8, Some(0.7)).await;

    assert!(result.total_found <= 8);
    for doc in &result.results {
        assert!((0.0..=1.0 + 1e-9).contains(&doc.similarity));
    }
    for pair in result.results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn test_multiple_queries_are_combined() {
    let (_db, engine) = loaded().await;

    let split = run(&engine, &["cancer", " treatment "], SearchMode::Statistical, 3, None).await;
    let joined = run(&engine, &["cancer treatment"], SearchMode::Statistical, 3, None).await;

    assert_eq!(ids(&split), ids(&joined));
}

#[tokio::test]
async fn test_top_k_bounds_results() {
    let (_db, engine) = loaded().await;

    let one = run(&engine, &["sleep"], SearchMode::Semantic, 1, None).await;
    assert_eq!(one.total_found, 1);

    // more requested than stored
    let all = run(&engine, &["sleep"], SearchMode::Semantic, 20, None).await;
    assert_eq!(all.total_found, 8);
    assert_eq!(all.results.len(), all.total_found);
}

#[tokio::test]
async fn test_concurrent_searches_share_engine() {
    let (_db, engine) = loaded().await;
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let mode = [SearchMode::Semantic, SearchMode::Statistical, SearchMode::Hybrid][i % 3];
                let request = SearchRequest::new(["cancer"], mode, 3, Some(0.5)).unwrap();
                engine.search(&request).await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.total_found, 3);
    }
}
