//! Lifecycle tests for the batch orchestrator against the mock backend.

use std::collections::HashMap;
use std::sync::Arc;

use atelier_client::{
    BlockingCompressor, ExtractionResponse, ImageCompressor, MockExtractionBackend,
};
use atelier_core::models::{
    AllowedValue, AttributeDefinition, DiscoveredAttribute, RawAttributeValue, RowStatus,
    SchemaMap,
};
use atelier_core::store::{DataService, MemoryStore};
use atelier_core::Error;
use atelier_jobs::{BatchOrchestrator, DiscoveryPolicy, ExtractionEvent, OrchestratorConfig};

/// Opt into log output with e.g. `RUST_LOG=atelier_jobs=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn schema() -> SchemaMap {
    let mut schema = SchemaMap::new();
    schema.insert(
        "neck_type".to_string(),
        AttributeDefinition::select(
            "neck_type",
            "Neck Type",
            vec![
                AllowedValue::new("RN", "Round Neck"),
                AllowedValue::new("VN", "V Neck"),
            ],
        ),
    );
    schema
}

fn response_with(raw_value: &str) -> ExtractionResponse {
    let mut attributes = HashMap::new();
    attributes.insert(
        "neck_type".to_string(),
        RawAttributeValue {
            raw_value: Some(raw_value.to_string()),
            confidence: 90.0,
            reasoning: String::new(),
        },
    );
    ExtractionResponse {
        attributes,
        tokens_used: 100,
        model_used: Some("mock-vision".to_string()),
        ..Default::default()
    }
}

fn orchestrator(
    backend: MockExtractionBackend,
    config: OrchestratorConfig,
) -> BatchOrchestrator {
    BatchOrchestrator::new(
        Arc::new(backend),
        Arc::new(BlockingCompressor::new()),
        config,
    )
}

#[tokio::test]
async fn test_batch_normalizes_and_completes_rows() {
    let backend =
        MockExtractionBackend::new().with_default_response(response_with("Round-Neck"));
    let orch = orchestrator(backend, OrchestratorConfig::default());

    orch.add_image("a.jpg", vec![1]).await;
    orch.add_image("b.jpg", vec![2]).await;

    let stats = orch.extract_all_pending(&schema()).await;
    assert_eq!(stats.done, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.tokens_used, 200);

    for row in orch.rows().await.iter() {
        assert_eq!(row.status, RowStatus::Done);
        let record = &row.attributes["neck_type"];
        assert_eq!(record.schema_value.as_deref(), Some("RN"));
        assert_eq!(record.raw_value.as_deref(), Some("Round-Neck"));
        assert_eq!(row.model_used.as_deref(), Some("mock-vision"));
    }
}

#[tokio::test]
async fn test_concurrency_ceiling_respected() {
    init_tracing();
    let backend = MockExtractionBackend::new()
        .with_default_response(response_with("RN"))
        .with_latency_ms(40);
    let orch = orchestrator(
        backend.clone(),
        OrchestratorConfig::default().with_concurrency(3),
    );

    for i in 0..8u8 {
        orch.add_image(format!("{i}.jpg"), vec![i]).await;
    }
    let stats = orch.extract_all_pending(&schema()).await;

    assert_eq!(stats.done, 8);
    let high_water = backend.max_concurrent_calls();
    assert!(high_water <= 3, "window exceeded the ceiling: {high_water}");
    assert!(high_water >= 2, "window never filled: {high_water}");
}

#[tokio::test]
async fn test_per_row_failure_does_not_block_siblings() {
    let backend = MockExtractionBackend::new()
        .with_default_response(response_with("round neck"))
        .with_failures_for_image(&[9], 10);
    let orch = orchestrator(backend, OrchestratorConfig::default().with_max_retries(1));

    let bad = orch.add_image("bad.jpg", vec![9]).await;
    orch.add_image("good.jpg", vec![1]).await;

    let stats = orch.extract_all_pending(&schema()).await;
    assert_eq!(stats.done, 1);
    assert_eq!(stats.failed, 1);

    let rows = orch.rows().await;
    let bad_row = rows.iter().find(|r| r.id == bad).unwrap();
    assert_eq!(bad_row.status, RowStatus::Error);
    assert_eq!(bad_row.retry_count, 1);
    assert!(bad_row.error.is_some());
}

#[tokio::test]
async fn test_retry_cap_excludes_rows_then_explicit_retry_overrides() {
    let backend = MockExtractionBackend::new().with_failures_for_image(&[9], 100);
    let orch = orchestrator(
        backend.clone(),
        OrchestratorConfig::default().with_max_retries(2),
    );
    orch.add_image("flaky.jpg", vec![9]).await;

    // Two batches exhaust the automatic retries.
    orch.extract_all_pending(&schema()).await;
    orch.extract_all_pending(&schema()).await;
    assert_eq!(backend.extract_call_count(), 2);

    // A third automatic pass must skip the row entirely.
    let stats = orch.extract_all_pending(&schema()).await;
    assert_eq!(backend.extract_call_count(), 2);
    assert_eq!(stats.failed, 1);

    // Explicit retry ignores the cap.
    orch.retry_failed(&schema()).await;
    assert_eq!(backend.extract_call_count(), 3);
}

#[tokio::test]
async fn test_cancellation_never_finalizes_rows() {
    init_tracing();
    let backend = MockExtractionBackend::new()
        .with_default_response(response_with("RN"))
        .with_latency_ms(100);
    let orch = Arc::new(orchestrator(
        backend,
        OrchestratorConfig::default().with_concurrency(2),
    ));
    for i in 0..6u8 {
        orch.add_image(format!("{i}.jpg"), vec![i]).await;
    }

    let mut events = orch.events();
    let runner = Arc::clone(&orch);
    let s = schema();
    let handle = tokio::spawn(async move { runner.extract_all_pending(&s).await });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    orch.cancel();
    let stats = handle.await.unwrap();

    // In-flight rows were reverted, queued rows never started.
    assert_eq!(stats.done, 0);
    for row in orch.rows().await.iter() {
        assert_eq!(row.status, RowStatus::Pending, "{}", row.original_file_name);
    }

    let mut finished_cancelled = false;
    while let Ok(event) = events.try_recv() {
        match event {
            ExtractionEvent::RowCompleted { .. } => panic!("row completed after cancel"),
            ExtractionEvent::BatchFinished { cancelled, .. } => finished_cancelled = cancelled,
            _ => {}
        }
    }
    assert!(finished_cancelled);
}

#[tokio::test]
async fn test_pause_stops_dispatch_and_resume_continues() {
    init_tracing();
    let backend = MockExtractionBackend::new()
        .with_default_response(response_with("RN"))
        .with_latency_ms(30);
    let orch = Arc::new(orchestrator(
        backend.clone(),
        OrchestratorConfig::default().with_concurrency(1),
    ));
    for i in 0..4u8 {
        orch.add_image(format!("{i}.jpg"), vec![i]).await;
    }

    let runner = Arc::clone(&orch);
    let s = schema();
    let handle = tokio::spawn(async move { runner.extract_all_pending(&s).await });

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    orch.pause();
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;
    let paused_count = backend.extract_call_count();
    assert!(paused_count < 4, "dispatch continued while paused");

    orch.resume();
    let stats = handle.await.unwrap();
    assert_eq!(stats.done, 4);
    assert_eq!(backend.extract_call_count(), 4);
}

#[tokio::test]
async fn test_progress_events_monotone_to_one_hundred() {
    let backend = MockExtractionBackend::new().with_default_response(response_with("RN"));
    let orch = orchestrator(backend, OrchestratorConfig::default());
    for i in 0..5u8 {
        orch.add_image(format!("{i}.jpg"), vec![i]).await;
    }

    let mut events = orch.events();
    orch.extract_all_pending(&schema()).await;

    let mut percents = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ExtractionEvent::BatchProgress { percent, .. } = event {
            percents.push(percent);
        }
    }
    assert_eq!(percents.len(), 5);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*percents.last().unwrap(), 100);
}

#[tokio::test]
async fn test_clear_completed_keeps_failures_and_prunes_store() {
    let store = MemoryStore::new();
    let backend = MockExtractionBackend::new()
        .with_default_response(response_with("RN"))
        .with_failures_for_image(&[9], 10);
    let orch = BatchOrchestrator::new(
        Arc::new(backend),
        Arc::new(BlockingCompressor::new()),
        OrchestratorConfig::default(),
    )
    .with_store(Arc::new(store.clone()));

    orch.add_image("good.jpg", vec![1]).await;
    let bad = orch.add_image("bad.jpg", vec![9]).await;
    orch.extract_all_pending(&schema()).await;

    orch.clear_completed().await;

    let rows = orch.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, bad);

    let cached = store.get_all_rows().await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, bad);
}

#[tokio::test]
async fn test_discoveries_aggregate_across_rows() {
    let discovery = DiscoveredAttribute {
        key: "cuff_style".to_string(),
        label: "Cuff Style".to_string(),
        normalized_value: "ribbed".to_string(),
        raw_value: "ribbed cuff".to_string(),
        confidence: 88.0,
        frequency: 0,
        reasoning: String::new(),
        possible_values: Vec::new(),
    };
    let response = ExtractionResponse {
        discoveries: vec![discovery],
        ..Default::default()
    };
    let backend = MockExtractionBackend::new().with_default_response(response);
    let orch = orchestrator(
        backend,
        OrchestratorConfig::default().with_discovery_mode(true),
    );
    orch.add_image("a.jpg", vec![1]).await;
    orch.add_image("b.jpg", vec![2]).await;
    orch.extract_all_pending(&schema()).await;

    let promoted = orch.promotable_discoveries(&DiscoveryPolicy::default());
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].key, "cuff_style");
    assert_eq!(promoted[0].frequency, 2);
}

#[tokio::test]
async fn test_extract_one_unknown_row_is_job_error() {
    let backend = MockExtractionBackend::new();
    let orch = orchestrator(backend, OrchestratorConfig::default());
    let err = orch
        .extract_one(uuid::Uuid::new_v4(), &schema())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Job(_)));
}

#[tokio::test]
async fn test_extract_one_returns_updated_row() {
    let backend = MockExtractionBackend::new().with_default_response(response_with("v neck"));
    let orch = orchestrator(backend, OrchestratorConfig::default());
    let id = orch.add_image("a.jpg", vec![1]).await;

    let row = orch.extract_one(id, &schema()).await.unwrap();
    assert_eq!(row.status, RowStatus::Done);
    assert_eq!(
        row.attributes["neck_type"].schema_value.as_deref(),
        Some("VN")
    );
}

#[tokio::test]
async fn test_extract_one_runs_after_cancel() {
    let backend = MockExtractionBackend::new().with_default_response(response_with("round neck"));
    let orch = orchestrator(backend, OrchestratorConfig::default());
    let id = orch.add_image("a.jpg", vec![1]).await;

    // A stale abort from a cancelled batch must not skip explicit work.
    orch.cancel();
    let row = orch.extract_one(id, &schema()).await.unwrap();
    assert_eq!(row.status, RowStatus::Done);
    assert_eq!(
        row.attributes["neck_type"].schema_value.as_deref(),
        Some("RN")
    );
}

#[tokio::test]
async fn test_destroyed_compressor_fails_rows_not_batch() {
    let backend = MockExtractionBackend::new().with_default_response(response_with("RN"));
    let compressor = BlockingCompressor::new();
    compressor.destroy();
    let orch = BatchOrchestrator::new(
        Arc::new(backend),
        Arc::new(compressor),
        OrchestratorConfig::default(),
    );
    orch.add_image("a.jpg", vec![1]).await;

    let stats = orch.extract_all_pending(&schema()).await;
    assert_eq!(stats.failed, 1);
    let rows = orch.rows().await;
    assert!(rows[0].error.as_deref().unwrap().contains("Compression"));
}
