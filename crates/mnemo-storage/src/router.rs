use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::record::{Filter, Record};
use crate::schema::{StorageDomain, TableName, TableSchema};

/// Routes every table-scoped call to the backend owning that table's domain
///
/// The table → backend map is fixed when the router is built (see
/// [`CompositeStorageBuilder`](crate::CompositeStorageBuilder)), so calls are
/// forwarded without any per-call branching.
#[derive(Clone)]
pub struct CompositeStorage {
    routes: HashMap<TableName, Arc<dyn StorageBackend>>,
}

impl CompositeStorage {
    pub(crate) fn new(routes: HashMap<TableName, Arc<dyn StorageBackend>>) -> Self {
        Self { routes }
    }

    pub fn builder() -> crate::CompositeStorageBuilder {
        crate::CompositeStorageBuilder::new()
    }

    /// Backend owning `table`
    pub fn backend_for(&self, table: TableName) -> Result<&Arc<dyn StorageBackend>> {
        self.routes
            .get(&table)
            .ok_or_else(|| StorageError::Unrouted(table.domain().to_string()))
    }

    /// Backend owning `domain`
    pub fn domain_backend(&self, domain: StorageDomain) -> Result<&Arc<dyn StorageBackend>> {
        domain
            .tables()
            .first()
            .ok_or_else(|| StorageError::Unrouted(domain.to_string()))
            .and_then(|table| self.backend_for(*table))
    }

    fn route(&self, table: TableName) -> Result<&Arc<dyn StorageBackend>> {
        let backend = self.backend_for(table)?;
        tracing::trace!(table = %table, backend = backend.name(), "Routing storage call");
        Ok(backend)
    }
}

#[async_trait]
impl StorageBackend for CompositeStorage {
    fn name(&self) -> &str {
        "composite"
    }

    async fn create_table(&self, table: TableName, schema: &TableSchema) -> Result<()> {
        self.route(table)?.create_table(table, schema).await
    }

    async fn alter_table(
        &self,
        table: TableName,
        schema: &TableSchema,
        if_not_exists: &[&str],
    ) -> Result<()> {
        self.route(table)?.alter_table(table, schema, if_not_exists).await
    }

    async fn clear_table(&self, table: TableName) -> Result<()> {
        self.route(table)?.clear_table(table).await
    }

    async fn insert(&self, table: TableName, record: Record) -> Result<()> {
        self.route(table)?.insert(table, record).await
    }

    async fn batch_insert(&self, table: TableName, records: Vec<Record>) -> Result<()> {
        self.route(table)?.batch_insert(table, records).await
    }

    async fn insert_new(&self, table: TableName, record: Record) -> Result<()> {
        self.route(table)?.insert_new(table, record).await
    }

    async fn batch_insert_new(&self, table: TableName, records: Vec<Record>) -> Result<()> {
        self.route(table)?.batch_insert_new(table, records).await
    }

    async fn load(&self, table: TableName, keys: &Filter) -> Result<Option<Record>> {
        self.route(table)?.load(table, keys).await
    }

    async fn select(&self, table: TableName, filter: &Filter) -> Result<Vec<Record>> {
        self.route(table)?.select(table, filter).await
    }

    async fn delete(&self, table: TableName, filter: &Filter) -> Result<u64> {
        self.route(table)?.delete(table, filter).await
    }
}
