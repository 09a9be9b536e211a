use mnemo_storage::{
    ensure_tables, table_schema, ColumnDef, ColumnType, Filter, MemoryBackend, Record, StorageBackend,
    StorageError, TableName, TableSchema,
};
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().expect("object fixture")
}

fn resource(id: &str) -> Record {
    record(json!({
        "id": id,
        "workingMemory": null,
        "metadata": {},
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z"
    }))
}

async fn backend_with(table: TableName) -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.create_table(table, &table_schema(table)).await.unwrap();
    backend
}

#[tokio::test]
async fn test_create_table_is_idempotent() {
    let backend = backend_with(TableName::Resources).await;
    backend.insert(TableName::Resources, resource("r1")).await.unwrap();

    backend
        .create_table(TableName::Resources, &table_schema(TableName::Resources))
        .await
        .unwrap();

    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_table_rejects_incompatible_schema() {
    let backend = backend_with(TableName::Resources).await;
    let conflicting = TableSchema::new()
        .column("id", ColumnDef::text().primary_key())
        .column("metadata", ColumnDef::text());

    let result = backend.create_table(TableName::Resources, &conflicting).await;
    assert!(matches!(result, Err(StorageError::Schema { .. })));
}

#[tokio::test]
async fn test_alter_table_adds_columns_and_keeps_rows() {
    let backend = backend_with(TableName::Resources).await;
    backend.insert(TableName::Resources, resource("r1")).await.unwrap();

    let evolved = table_schema(TableName::Resources).column("locale", ColumnDef::text().nullable());
    backend
        .alter_table(TableName::Resources, &evolved, &["locale", "id"])
        .await
        .unwrap();

    let mut with_locale = resource("r2");
    with_locale.insert("locale".to_string(), json!("pt-BR"));
    backend.insert(TableName::Resources, with_locale).await.unwrap();

    let loaded = backend
        .load(TableName::Resources, &Filter::by("id", "r1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded["id"], json!("r1"));
    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 2);
}

#[tokio::test]
async fn test_alter_table_rejects_required_column_on_populated_table() {
    let backend = backend_with(TableName::Resources).await;
    backend.insert(TableName::Resources, resource("r1")).await.unwrap();

    let evolved = table_schema(TableName::Resources).column("tier", ColumnDef::new(ColumnType::Integer));
    let result = backend.alter_table(TableName::Resources, &evolved, &["tier"]).await;

    assert!(matches!(result, Err(StorageError::Schema { .. })));
}

#[tokio::test]
async fn test_insert_is_upsert_by_primary_key() {
    let backend = backend_with(TableName::Resources).await;
    backend.insert(TableName::Resources, resource("r1")).await.unwrap();

    let mut updated = resource("r1");
    updated.insert("workingMemory".to_string(), json!("prefers email"));
    backend.insert(TableName::Resources, updated).await.unwrap();

    let loaded = backend
        .load(TableName::Resources, &Filter::by("id", "r1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded["workingMemory"], json!("prefers email"));
    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 1);
}

#[tokio::test]
async fn test_batch_insert_is_all_or_nothing() {
    let backend = backend_with(TableName::Resources).await;

    let mut broken = resource("r2");
    broken.remove("createdAt");
    let result = backend
        .batch_insert(TableName::Resources, vec![resource("r1"), broken, resource("r3")])
        .await;

    assert!(matches!(result, Err(StorageError::Schema { .. })));
    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_new_never_overwrites() {
    let backend = backend_with(TableName::Resources).await;
    backend.insert_new(TableName::Resources, resource("r1")).await.unwrap();

    let mut updated = resource("r1");
    updated.insert("workingMemory".to_string(), json!("overwritten"));
    let result = backend.insert_new(TableName::Resources, updated).await;

    assert!(matches!(result, Err(StorageError::AlreadyExists { ref key, .. }) if key == "r1"));
    let loaded = backend
        .load(TableName::Resources, &Filter::by("id", "r1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded["workingMemory"], json!(null));
}

#[tokio::test]
async fn test_batch_insert_new_rejects_taken_and_repeated_keys() {
    let backend = backend_with(TableName::Resources).await;
    backend.insert(TableName::Resources, resource("r1")).await.unwrap();

    let taken = backend
        .batch_insert_new(TableName::Resources, vec![resource("r2"), resource("r1")])
        .await;
    let repeated = backend
        .batch_insert_new(TableName::Resources, vec![resource("r3"), resource("r3")])
        .await;

    assert!(matches!(taken, Err(StorageError::AlreadyExists { .. })));
    assert!(matches!(repeated, Err(StorageError::AlreadyExists { .. })));
    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 1);

    backend
        .batch_insert_new(TableName::Resources, vec![resource("r2"), resource("r3")])
        .await
        .unwrap();
    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 3);
}

#[tokio::test]
async fn test_load_missing_row_is_none() {
    let backend = backend_with(TableName::Resources).await;
    let loaded = backend
        .load(TableName::Resources, &Filter::by("id", "nobody"))
        .await
        .unwrap();
    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_unknown_table_is_a_schema_error() {
    let backend = MemoryBackend::new();

    assert!(matches!(
        backend.insert(TableName::Scores, Record::new()).await,
        Err(StorageError::Schema { .. })
    ));
    assert!(matches!(
        backend.select(TableName::Scores, &Filter::new()).await,
        Err(StorageError::Schema { .. })
    ));
}

#[tokio::test]
async fn test_side_effects_stay_in_named_table() {
    let backend = MemoryBackend::new();
    ensure_tables(&backend, &TableName::ALL).await.unwrap();
    backend.insert(TableName::Resources, resource("r1")).await.unwrap();

    backend.clear_table(TableName::Threads).await.unwrap();

    assert_eq!(backend.row_count(TableName::Resources).await.unwrap(), 1);
    assert_eq!(backend.row_count(TableName::Threads).await.unwrap(), 0);
}

#[tokio::test]
async fn test_ensure_tables_upgrades_existing_tables() {
    let backend = MemoryBackend::new();
    let old = TableSchema::new()
        .column("id", ColumnDef::text().primary_key())
        .column("createdAt", ColumnDef::timestamp())
        .column("updatedAt", ColumnDef::timestamp());
    backend.create_table(TableName::Resources, &old).await.unwrap();

    ensure_tables(&backend, &[TableName::Resources]).await.unwrap();

    backend.insert(TableName::Resources, resource("r1")).await.unwrap();
}

#[tokio::test]
async fn test_select_and_delete_by_indexed_column() {
    let backend = backend_with(TableName::Threads).await;
    for (id, owner) in [("t1", "alice"), ("t2", "bob"), ("t3", "alice")] {
        backend
            .insert(
                TableName::Threads,
                record(json!({
                    "id": id,
                    "resourceId": owner,
                    "title": null,
                    "metadata": {},
                    "createdAt": "2024-05-01T10:00:00Z",
                    "updatedAt": "2024-05-01T10:00:00Z"
                })),
            )
            .await
            .unwrap();
    }

    let alice = backend
        .select(TableName::Threads, &Filter::by("resourceId", "alice"))
        .await
        .unwrap();
    let ids: Vec<_> = alice.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("t1"), json!("t3")]);

    let removed = backend
        .delete(TableName::Threads, &Filter::by("resourceId", "alice"))
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(backend.row_count(TableName::Threads).await.unwrap(), 1);
}
