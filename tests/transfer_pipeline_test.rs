//! Integration tests for the transfer pipeline against the in-memory store

use bson::oid::ObjectId;
use bson::{bson, doc, Bson};
use siphon::adapters::memory::{MemoryStore, StoreOperation};
use siphon::adapters::store::Namespace;
use siphon::config::{
    secret_string, AggregationConfig, ApplicationConfig, DocumentIdSetting, LoggingConfig,
    SiphonConfig, SourceConfig, TargetConfig,
};
use siphon::core::transfer::{
    EventSink, PipelineState, RunSummary, TransferEvent, TransferPipeline,
};
use siphon::domain::{Result, SiphonError, StoreError};
use std::sync::Arc;

const SOURCE_URI: &str = "mongodb://source:27017";
const TARGET_URI: &str = "mongodb://target:27017";
const MERGE_ID: &str = "68a8c8207090be6dd0e23a90";

fn source_ns() -> Namespace {
    Namespace::new("crystal", "users")
}

fn target_ns() -> Namespace {
    Namespace::new("pool", "collected")
}

fn config(batch_size: usize) -> SiphonConfig {
    SiphonConfig {
        application: ApplicationConfig::default(),
        source: SourceConfig {
            uri: secret_string(SOURCE_URI.to_string()),
            db: "crystal".to_string(),
            collection: "users".to_string(),
            field: "v".to_string(),
            filter: serde_json::Map::new(),
        },
        target: TargetConfig {
            uri: secret_string(TARGET_URI.to_string()),
            db: "pool".to_string(),
            collection: "collected".to_string(),
            field: "values".to_string(),
            document_id: None,
            rewrite_documents: false,
            rewrite_array: false,
            duplicates_in_array: false,
            unwrap_object_id: false,
        },
        aggregation: AggregationConfig {
            allow_disk_use: true,
            batch_size,
        },
        logging: LoggingConfig::default(),
    }
}

fn merge_config(batch_size: usize) -> SiphonConfig {
    let mut config = config(batch_size);
    config.target.document_id = Some(DocumentIdSetting::Id(MERGE_ID.to_string()));
    config
}

fn seed_ints(store: &MemoryStore, values: &[i32]) {
    store.seed_values(&source_ns(), "v", values.iter().map(|v| Bson::Int32(*v)));
}

fn stored_arrays(store: &MemoryStore) -> Vec<Bson> {
    store
        .documents(&target_ns())
        .into_iter()
        .filter_map(|mut d| d.remove("values"))
        .collect()
}

fn merge_target_values(store: &MemoryStore) -> Option<Bson> {
    let id = Bson::ObjectId(ObjectId::parse_str(MERGE_ID).unwrap());
    store
        .documents(&target_ns())
        .into_iter()
        .find(|d| d.get("_id") == Some(&id))
        .and_then(|mut d| d.remove("values"))
}

fn write_lengths(store: &MemoryStore) -> Vec<usize> {
    store
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            StoreOperation::Insert { len, .. }
            | StoreOperation::UpsertSet { len, .. }
            | StoreOperation::UpsertAppend { len, .. } => Some(len),
            _ => None,
        })
        .collect()
}

async fn run(store: &MemoryStore, config: SiphonConfig) -> (Result<RunSummary>, PipelineState) {
    let mut pipeline = TransferPipeline::new(config, Arc::new(store.clone()));
    let result = pipeline.run().await;
    (result, pipeline.state())
}

#[tokio::test]
async fn test_rewrite_documents_inserts_fixed_size_batches() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3, 4, 5]);
    store.seed(&target_ns(), vec![doc! { "_id": "old-1" }, doc! { "_id": "old-2" }]);

    let mut config = config(2);
    config.target.rewrite_documents = true;
    let (result, state) = run(&store, config).await;
    let summary = result.unwrap();

    assert_eq!(state, PipelineState::Completed);
    assert_eq!(summary.total_collected, 5);
    assert_eq!(summary.docs_written, 3);
    assert_eq!(summary.removed, Some(2));
    assert_eq!(
        stored_arrays(&store),
        vec![bson!([1, 2]), bson!([3, 4]), bson!([5])]
    );
}

#[tokio::test]
async fn test_clear_happens_before_first_read() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1]);

    let mut config = config(10);
    config.target.rewrite_documents = true;
    run(&store, config).await.0.unwrap();

    let operations = store.operations();
    assert!(matches!(operations[0], StoreOperation::Clear { .. }));
    assert!(matches!(operations[1], StoreOperation::Aggregate { .. }));
    assert_eq!(
        operations
            .iter()
            .filter(|op| matches!(op, StoreOperation::Clear { .. }))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_without_rewrite_existing_documents_are_kept() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2]);
    store.seed(&target_ns(), vec![doc! { "_id": "old", "values": [0] }]);

    let summary = run(&store, config(5)).await.0.unwrap();

    assert_eq!(summary.removed, None);
    assert_eq!(stored_arrays(&store), vec![bson!([0]), bson!([1, 2])]);
}

#[tokio::test]
async fn test_identifiers_unwrapped_to_hex() {
    let store = MemoryStore::new();
    let ids: Vec<ObjectId> = (0..4).map(|_| ObjectId::new()).collect();
    store.seed_values(&source_ns(), "v", ids.iter().map(|id| Bson::ObjectId(*id)));

    let mut config = config(3);
    config.target.unwrap_object_id = true;
    run(&store, config).await.0.unwrap();

    let stored: Vec<Bson> = stored_arrays(&store)
        .into_iter()
        .flat_map(|array| match array {
            Bson::Array(items) => items,
            other => vec![other],
        })
        .collect();
    assert_eq!(stored.len(), 4);
    for (value, id) in stored.iter().zip(&ids) {
        match value {
            Bson::String(hex) => {
                assert_eq!(hex.len(), 24);
                assert_eq!(hex, &id.to_hex());
            }
            other => panic!("expected hex string, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_identifiers_kept_without_unwrap() {
    let store = MemoryStore::new();
    let id = ObjectId::new();
    store.seed_values(&source_ns(), "v", [Bson::ObjectId(id)]);

    run(&store, config(3)).await.0.unwrap();

    assert_eq!(stored_arrays(&store), vec![Bson::Array(vec![Bson::ObjectId(id)])]);
}

#[tokio::test]
async fn test_set_union_merge_across_flushes() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 2, 3]);

    let summary = run(&store, merge_config(2)).await.0.unwrap();

    assert_eq!(summary.total_collected, 4);
    assert_eq!(summary.docs_written, 2);
    assert_eq!(merge_target_values(&store), Some(bson!([1, 2, 3])));
    assert_eq!(store.documents(&target_ns()).len(), 1);
}

#[tokio::test]
async fn test_set_union_keeps_existing_values() {
    let store = MemoryStore::new();
    seed_ints(&store, &[3, 4, 5]);
    let id = ObjectId::parse_str(MERGE_ID).unwrap();
    store.seed(&target_ns(), vec![doc! { "_id": id, "values": [1, 3] }]);

    run(&store, merge_config(2)).await.0.unwrap();

    assert_eq!(merge_target_values(&store), Some(bson!([1, 3, 4, 5])));
}

#[tokio::test]
async fn test_duplicates_allowed_on_push() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 2, 3]);

    let mut config = merge_config(2);
    config.target.duplicates_in_array = true;
    run(&store, config).await.0.unwrap();

    assert_eq!(merge_target_values(&store), Some(bson!([1, 2, 2, 3])));
}

#[tokio::test]
async fn test_rewrite_array_overwrites_on_every_flush() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3, 4, 5]);

    let mut config = merge_config(2);
    config.target.rewrite_array = true;
    let summary = run(&store, config).await.0.unwrap();

    assert_eq!(summary.docs_written, 3);
    // Last flush wins; earlier batches are replaced, not accumulated
    assert_eq!(merge_target_values(&store), Some(bson!([5])));
    assert_eq!(
        store
            .operations()
            .iter()
            .filter(|op| matches!(op, StoreOperation::UpsertSet { .. }))
            .count(),
        3
    );
}

#[tokio::test]
async fn test_rewrite_documents_disables_merge_target() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3]);

    let mut config = merge_config(2);
    config.target.rewrite_documents = true;
    run(&store, config).await.0.unwrap();

    assert_eq!(merge_target_values(&store), None);
    assert_eq!(stored_arrays(&store), vec![bson!([1, 2]), bson!([3])]);
}

#[tokio::test]
async fn test_raw_string_document_id() {
    let store = MemoryStore::new();
    seed_ints(&store, &[7]);

    let mut config = config(2);
    config.target.document_id = Some(DocumentIdSetting::Id("daily-snapshot".to_string()));
    run(&store, config).await.0.unwrap();

    let documents = store.documents(&target_ns());
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].get_str("_id").unwrap(), "daily-snapshot");
    assert_eq!(documents[0].get("values"), Some(&bson!([7])));
}

#[tokio::test]
async fn test_integer_document_id_merges_into_numeric_id() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3]);
    store.seed(&target_ns(), vec![doc! { "_id": 42_i64, "values": [1] }]);

    let mut config = config(2);
    config.target.document_id = Some(DocumentIdSetting::Number(42));
    let summary = run(&store, config).await.0.unwrap();

    assert_eq!(summary.docs_written, 2);
    let documents = store.documents(&target_ns());
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].get("_id"), Some(&Bson::Int64(42)));
    assert_eq!(documents[0].get("values"), Some(&bson!([1, 2, 3])));
}

#[tokio::test]
async fn test_batch_size_at_upper_bound_runs_small_source() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3]);

    let config = config(u32::MAX as usize);
    config.validate().unwrap();
    let (result, state) = run(&store, config).await;
    let summary = result.unwrap();

    assert_eq!(state, PipelineState::Completed);
    assert_eq!(summary.total_collected, 3);
    assert_eq!(summary.docs_written, 1);
    assert_eq!(stored_arrays(&store), vec![bson!([1, 2, 3])]);
    assert_eq!(store.connections_closed(), 2);
}

#[tokio::test]
async fn test_empty_values_are_excluded() {
    let store = MemoryStore::new();
    store.seed(
        &source_ns(),
        vec![
            doc! { "_id": 1, "v": 1 },
            doc! { "_id": 2, "v": Bson::Null },
            doc! { "_id": 3 },
            doc! { "_id": 4, "v": [Bson::Null, Bson::Null] },
            doc! { "_id": 5, "v": [Bson::Null, 9] },
            doc! { "_id": 6, "v": 0 },
        ],
    );

    let summary = run(&store, config(10)).await.0.unwrap();

    assert_eq!(summary.total_collected, 3);
    assert_eq!(summary.docs_written, 1);
    assert_eq!(stored_arrays(&store), vec![bson!([1, [9], 0])]);
}

#[tokio::test]
async fn test_no_values_writes_nothing() {
    let store = MemoryStore::new();
    store.seed_values(&source_ns(), "v", [Bson::Null]);

    let summary = run(&store, config(2)).await.0.unwrap();

    assert_eq!(summary.total_collected, 0);
    assert_eq!(summary.docs_written, 0);
    assert!(store.documents(&target_ns()).is_empty());
}

#[tokio::test]
async fn test_counters_match_flushes_and_batch_bounds() {
    for (count, batch_size) in [(0usize, 1usize), (1, 1), (7, 3), (9, 3), (10, 4), (3, 100)] {
        let store = MemoryStore::new();
        let values: Vec<i32> = (0..count as i32).collect();
        seed_ints(&store, &values);

        let summary = run(&store, config(batch_size)).await.0.unwrap();
        let lengths = write_lengths(&store);

        assert_eq!(summary.total_collected as usize, lengths.iter().sum::<usize>());
        assert_eq!(summary.docs_written as usize, lengths.len());
        assert_eq!(lengths.len(), count.div_ceil(batch_size));
        assert!(lengths.iter().all(|len| (1..=batch_size).contains(len)));
        if let Some((last, full)) = lengths.split_last() {
            assert!(full.iter().all(|len| *len == batch_size));
            assert!(*last <= batch_size);
        }
    }
}

#[tokio::test]
async fn test_filter_selects_documents() {
    let store = MemoryStore::new();
    store.seed(
        &source_ns(),
        vec![
            doc! { "_id": 1, "v": "a", "profile": { "status": "active" } },
            doc! { "_id": 2, "v": "b", "profile": { "status": "banned" } },
            doc! { "_id": 3, "v": "c", "profile": { "status": "active" } },
        ],
    );

    let mut config = config(10);
    config.source.filter = serde_json::json!({ "profile.status": "active" })
        .as_object()
        .cloned()
        .unwrap();
    let summary = run(&store, config).await.0.unwrap();

    assert_eq!(summary.total_collected, 2);
    assert_eq!(stored_arrays(&store), vec![bson!(["a", "c"])]);
}

#[tokio::test]
async fn test_dotted_source_field() {
    let store = MemoryStore::new();
    store.seed(
        &source_ns(),
        vec![
            doc! { "_id": 1, "profile": { "email": "a@example.com" } },
            doc! { "_id": 2, "profile": {} },
        ],
    );

    let mut config = config(10);
    config.source.field = "profile.email".to_string();
    let summary = run(&store, config).await.0.unwrap();

    assert_eq!(summary.total_collected, 1);
    assert_eq!(stored_arrays(&store), vec![bson!(["a@example.com"])]);
}

#[tokio::test]
async fn test_unreachable_target_fails_before_any_read() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2]);
    store.set_unreachable(TARGET_URI);

    let mut config = config(2);
    config.target.rewrite_documents = true;
    let (result, state) = run(&store, config).await;

    assert!(matches!(result, Err(SiphonError::Connection(_))));
    assert_eq!(state, PipelineState::Failed);
    assert!(store.operations().is_empty());
    assert_eq!(store.connections_opened(), 1);
    assert_eq!(store.connections_closed(), 1);
}

#[tokio::test]
async fn test_unreachable_source_opens_nothing() {
    let store = MemoryStore::new();
    store.set_unreachable(SOURCE_URI);

    let (result, state) = run(&store, config(2)).await;

    let err = result.unwrap_err();
    assert!(matches!(err, SiphonError::Connection(_)));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(state, PipelineState::Failed);
    assert_eq!(store.connections_opened(), 0);
    assert_eq!(store.connections_closed(), 0);
}

#[tokio::test]
async fn test_write_failure_aborts_run() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3, 4, 5, 6]);
    store.fail_writes_after(1);

    let (result, state) = run(&store, config(2)).await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        SiphonError::Store(StoreError::InsertFailed { .. })
    ));
    assert_eq!(err.exit_code(), 5);
    assert_eq!(state, PipelineState::Failed);
    // The batch committed before the failure stays; nothing after it is attempted
    assert_eq!(stored_arrays(&store), vec![bson!([1, 2])]);
    assert_eq!(write_lengths(&store), vec![2]);
    assert_eq!(store.connections_opened(), 2);
    assert_eq!(store.connections_closed(), 2);
}

#[tokio::test]
async fn test_clear_failure_aborts_before_read() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2]);
    store.fail_clear();

    let mut config = config(2);
    config.target.rewrite_documents = true;
    let (result, _) = run(&store, config).await;

    assert!(matches!(
        result,
        Err(SiphonError::Store(StoreError::ClearFailed { .. }))
    ));
    assert!(!store
        .operations()
        .iter()
        .any(|op| matches!(op, StoreOperation::Aggregate { .. })));
    assert_eq!(store.connections_closed(), 2);
}

#[tokio::test]
async fn test_unsupported_filter_releases_connections() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1]);

    let mut config = config(2);
    config.source.filter = serde_json::json!({ "v": { "$gt": 0 } })
        .as_object()
        .cloned()
        .unwrap();
    let (result, state) = run(&store, config).await;

    assert!(matches!(
        result,
        Err(SiphonError::Store(StoreError::InvalidFilter(_)))
    ));
    assert_eq!(state, PipelineState::Failed);
    assert_eq!(store.connections_closed(), 2);
}

#[tokio::test]
async fn test_connections_released_once_on_success() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3]);

    run(&store, config(2)).await.0.unwrap();

    assert_eq!(store.connections_opened(), 2);
    assert_eq!(store.connections_closed(), 2);
}

#[tokio::test]
async fn test_events_follow_state_machine() {
    let store = MemoryStore::new();
    seed_ints(&store, &[1, 2, 3]);
    store.seed(&target_ns(), vec![doc! { "_id": "old" }]);

    let mut config = config(2);
    config.target.rewrite_documents = true;
    let (events, mut receiver) = EventSink::channel();
    let mut pipeline =
        TransferPipeline::new(config, Arc::new(store.clone())).with_events(events);
    let summary = pipeline.run().await.unwrap();
    drop(pipeline);

    let mut received = Vec::new();
    while let Some(event) = receiver.recv().await {
        received.push(event);
    }

    let states: Vec<PipelineState> = received
        .iter()
        .filter_map(|event| match event {
            TransferEvent::StateChanged(state) => Some(*state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            PipelineState::Connected,
            PipelineState::Clearing,
            PipelineState::Streaming,
            PipelineState::Draining,
            PipelineState::Completed,
        ]
    );

    assert!(received.contains(&TransferEvent::Cleared { removed: 1 }));

    let progress: Vec<(usize, u64, u64)> = received
        .iter()
        .filter_map(|event| match event {
            TransferEvent::BatchWritten {
                batch_len,
                total_collected,
                docs_written,
                ..
            } => Some((*batch_len, *total_collected, *docs_written)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(2, 2, 1), (1, 3, 2)]);

    assert_eq!(received.last(), Some(&TransferEvent::Completed(summary)));
}

#[tokio::test]
async fn test_failure_event_is_last() {
    let store = MemoryStore::new();
    store.set_unreachable(TARGET_URI);

    let (events, mut receiver) = EventSink::channel();
    let mut pipeline =
        TransferPipeline::new(config(2), Arc::new(store.clone())).with_events(events);
    assert!(pipeline.run().await.is_err());
    drop(pipeline);

    let mut received = Vec::new();
    while let Some(event) = receiver.recv().await {
        received.push(event);
    }

    assert_eq!(
        received.first(),
        Some(&TransferEvent::StateChanged(PipelineState::Failed))
    );
    assert!(matches!(received.last(), Some(TransferEvent::Failed { .. })));
}
