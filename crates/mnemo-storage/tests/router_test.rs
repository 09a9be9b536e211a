use std::sync::Arc;

use mnemo_storage::{
    ensure_tables, CompositeStorage, ConversationStore, Filter, MemoryBackend, Score, ScoreStore,
    StorageBackend, StorageDomain, StorageError, TableName, Thread, TraceSpan, TraceStore,
};

#[test]
fn test_build_fails_for_unrouted_domain() {
    let result = CompositeStorage::builder()
        .conversations(Arc::new(MemoryBackend::new()))
        .build();

    assert!(matches!(result, Err(StorageError::Unrouted(_))));
}

#[test]
fn test_default_backend_covers_every_domain() {
    let storage = CompositeStorage::builder()
        .default_backend(Arc::new(MemoryBackend::named("shared")))
        .build()
        .unwrap();

    for table in TableName::ALL {
        assert_eq!(storage.backend_for(table).unwrap().name(), "shared");
    }
}

#[test]
fn test_explicit_domain_overrides_default() {
    let storage = CompositeStorage::builder()
        .default_backend(Arc::new(MemoryBackend::named("shared")))
        .traces(Arc::new(MemoryBackend::named("fast")))
        .build()
        .unwrap();

    assert_eq!(storage.backend_for(TableName::Traces).unwrap().name(), "fast");
    assert_eq!(storage.domain_backend(StorageDomain::Conversations).unwrap().name(), "shared");
}

#[tokio::test]
async fn test_calls_land_on_owning_backend() {
    let conversations = Arc::new(MemoryBackend::named("conversations"));
    let rest = Arc::new(MemoryBackend::named("rest"));
    let storage = Arc::new(
        CompositeStorage::builder()
            .conversations(conversations.clone())
            .default_backend(rest.clone())
            .build()
            .unwrap(),
    );
    ensure_tables(storage.as_ref(), &TableName::ALL).await.unwrap();

    ConversationStore::new(storage.clone())
        .save_thread(Thread::new("t1", "r1"))
        .await
        .unwrap();
    ScoreStore::new(storage.clone())
        .save_score(Score::new("relevance", "run-1", "m1", "message", 0.9))
        .await
        .unwrap();

    assert_eq!(conversations.row_count(TableName::Threads).await.unwrap(), 1);
    assert!(rest.row_count(TableName::Threads).await.is_err());
    assert_eq!(rest.row_count(TableName::Scores).await.unwrap(), 1);
    assert!(conversations.row_count(TableName::Scores).await.is_err());
}

#[tokio::test]
async fn test_batch_insert_is_forwarded_for_every_table() {
    let storage = Arc::new(
        CompositeStorage::builder()
            .default_backend(Arc::new(MemoryBackend::new()))
            .build()
            .unwrap(),
    );
    ensure_tables(storage.as_ref(), &TableName::ALL).await.unwrap();

    TraceStore::new(storage.clone())
        .batch_insert_spans(vec![TraceSpan::new("trace-1", "agent.run"), TraceSpan::new("trace-1", "llm.call")])
        .await
        .unwrap();

    let threads = vec![Thread::new("t1", "r1"), Thread::new("t2", "r1")]
        .iter()
        .map(|t| serde_json::to_value(t).unwrap().as_object().cloned().unwrap())
        .collect();
    storage.batch_insert(TableName::Threads, threads).await.unwrap();

    assert_eq!(storage.select(TableName::Traces, &Filter::new()).await.unwrap().len(), 2);
    assert_eq!(storage.select(TableName::Threads, &Filter::new()).await.unwrap().len(), 2);
}
