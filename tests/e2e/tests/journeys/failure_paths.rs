//! Journey: every failure aborts the call and names its stage and mode

use std::sync::Arc;
use std::time::Duration;

use sift_core::search::{ErrorKind, Stage};
use sift_core::{EngineOptions, SearchError, SearchMode, SearchParams, SearchRequest};
use sift_e2e_tests::harness::TestDatabaseManager;
use sift_e2e_tests::mocks::{
    CountingEncoder, FailingEncoder, HashingEncoder, SlowEncoder, TestDataFactory,
};

#[tokio::test]
async fn test_validation_happens_before_any_remote_call() {
    let db = TestDatabaseManager::new_temp();
    let counter = Arc::new(CountingEncoder::new(Arc::new(HashingEncoder)));
    let engine = db.engine(counter.clone());

    let rejected = [
        r#"{"queries": ["  ", ""], "search_type": "semantic"}"#,
        r#"{"queries": ["x"], "search_type": "hybrid", "alpha": null}"#,
        r#"{"queries": ["x"], "top_k": 0}"#,
        r#"{"queries": ["x"], "top_k": 21}"#,
        r#"{"queries": ["x"], "search_type": "hybrid", "alpha": 1.5}"#,
    ];

    for body in rejected {
        let params: SearchParams = serde_json::from_str(body).unwrap();
        let err = engine.search_params(params).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{body}");
    }

    assert_eq!(counter.calls(), 0);
}

#[tokio::test]
async fn test_omitted_alpha_defaults_for_hybrid() {
    let db = TestDatabaseManager::new_temp();
    let engine = db.engine(Arc::new(HashingEncoder));
    TestDataFactory::load_medical_corpus(&engine).await;

    let params: SearchParams =
        serde_json::from_str(r#"{"queries": ["cancer"], "search_type": "hybrid"}"#).unwrap();
    let result = engine.search_params(params).await.unwrap();
    assert_eq!(result.total_found, 5);
}

#[tokio::test]
async fn test_dense_failure_aborts_every_mode() {
    let db = TestDatabaseManager::new_temp();
    let engine = db.engine(Arc::new(FailingEncoder));

    for mode in [SearchMode::Semantic, SearchMode::Statistical, SearchMode::Hybrid] {
        let request = SearchRequest::new(["cancer"], mode, 5, Some(0.5)).unwrap();
        let err = engine.search(&request).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.stage(), Some(Stage::DenseEncoding));
        assert!(err.to_string().contains(mode.as_str()));
        assert!(err.to_string().contains("401"));
    }
}

#[tokio::test]
async fn test_dense_timeout_reported_as_encoding_stage() {
    let db = TestDatabaseManager::new_temp();
    let options = EngineOptions {
        embed_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let engine = db.engine_with_options(
        Arc::new(SlowEncoder {
            delay: Duration::from_secs(10),
        }),
        options,
    );

    let request = SearchRequest::new(["cancer"], SearchMode::Hybrid, 5, Some(0.5)).unwrap();
    let err = engine.search(&request).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::Timeout {
            stage: Stage::DenseEncoding,
            mode: SearchMode::Hybrid,
            ..
        }
    ));
}

#[tokio::test]
async fn test_storage_failure_names_storage_stage() {
    let db = TestDatabaseManager::new_temp();
    let engine = db.engine(Arc::new(HashingEncoder));
    TestDataFactory::load_medical_corpus(&engine).await;

    db.connect().execute_batch("DROP TABLE documents").unwrap();

    let request = SearchRequest::new(["cancer"], SearchMode::Statistical, 3, None).unwrap();
    let err = engine.search(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(err.stage(), Some(Stage::Storage));
    assert!(err.to_string().contains("statistical"));
}

#[tokio::test]
async fn test_engine_recovers_after_failure() {
    let db = TestDatabaseManager::new_temp();
    let engine = db.engine(Arc::new(HashingEncoder));
    TestDataFactory::load_medical_corpus(&engine).await;

    let bad = SearchRequest::new(["x"], SearchMode::Semantic, 25, None);
    assert!(bad.is_err());

    // each call opens its own connection, so nothing is left over
    for _ in 0..3 {
        let request = SearchRequest::new(["sleep"], SearchMode::Semantic, 2, None).unwrap();
        assert_eq!(engine.search(&request).await.unwrap().total_found, 2);
    }
}
