use async_trait::async_trait;

use crate::error::Result;
use crate::record::{Filter, Record};
use crate::schema::{TableName, TableSchema};

/// Capability set every durable backend implements
///
/// Every operation is scoped to one table and has no effect on any other.
/// Operations on a table that was never created fail with
/// [`StorageError::Schema`](crate::StorageError::Schema). Absent rows are
/// reported as `None` or an empty result, never as an error.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Create a table, or verify that an existing one is compatible
    async fn create_table(&self, table: TableName, schema: &TableSchema) -> Result<()>;

    /// Add the listed columns of `schema` that the table does not have yet
    ///
    /// Existing columns are never dropped or redefined.
    async fn alter_table(
        &self,
        table: TableName,
        schema: &TableSchema,
        if_not_exists: &[&str],
    ) -> Result<()>;

    /// Remove every row, keeping the table and its schema
    async fn clear_table(&self, table: TableName) -> Result<()>;

    /// Upsert one record by primary key
    async fn insert(&self, table: TableName, record: Record) -> Result<()>;

    /// Upsert many records
    ///
    /// Backends document whether this is all-or-nothing or best-effort
    /// sequential.
    async fn batch_insert(&self, table: TableName, records: Vec<Record>) -> Result<()>;

    /// Insert one record whose primary key is not taken yet
    ///
    /// The check and the write are atomic. A taken key fails with
    /// [`StorageError::AlreadyExists`](crate::StorageError::AlreadyExists)
    /// and leaves the stored row untouched.
    async fn insert_new(&self, table: TableName, record: Record) -> Result<()>;

    /// Insert many records whose primary keys are all free
    ///
    /// A key that is taken, or repeated inside the batch, rejects the whole
    /// batch with `AlreadyExists`.
    async fn batch_insert_new(&self, table: TableName, records: Vec<Record>) -> Result<()>;

    /// Load the record whose primary key equals `keys`
    async fn load(&self, table: TableName, keys: &Filter) -> Result<Option<Record>>;

    /// Every record matching `filter`, in insertion order
    async fn select(&self, table: TableName, filter: &Filter) -> Result<Vec<Record>>;

    /// Delete every record matching `filter`, returning how many went away
    async fn delete(&self, table: TableName, filter: &Filter) -> Result<u64>;
}

/// Create `tables` on `backend` with their current schemas
///
/// Existing tables are brought up to date: columns added since they were
/// created are appended through `alter_table`.
pub async fn ensure_tables(backend: &dyn StorageBackend, tables: &[TableName]) -> Result<()> {
    for &table in tables {
        let schema = crate::schema::table_schema(table);
        let columns: Vec<&str> = schema.columns().map(|(name, _)| name).collect();

        // Fails on a missing table; create_table below reports real conflicts
        if let Err(err) = backend.alter_table(table, &schema, &columns).await {
            if !matches!(err, crate::StorageError::Schema { .. }) {
                return Err(err);
            }
        }
        backend.create_table(table, &schema).await?;
    }
    Ok(())
}
