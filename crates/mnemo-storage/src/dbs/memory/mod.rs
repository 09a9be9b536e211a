mod table;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::record::{Filter, Record};
use crate::schema::{TableName, TableSchema};

use self::table::MemoryTable;

/// Process-local reference backend
///
/// Each operation runs in one critical section on a `tokio` lock that is
/// never held across an await. `batch_insert` and `batch_insert_new` are
/// all-or-nothing: every record is validated before any is written.
pub struct MemoryBackend {
    name: String,
    tables: RwLock<HashMap<TableName, MemoryTable>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows currently stored in `table`
    pub async fn row_count(&self, table: TableName) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(existing(&tables, table)?.len())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn existing(tables: &HashMap<TableName, MemoryTable>, table: TableName) -> Result<&MemoryTable> {
    tables
        .get(&table)
        .ok_or_else(|| StorageError::schema(table, "table does not exist"))
}

fn existing_mut(
    tables: &mut HashMap<TableName, MemoryTable>,
    table: TableName,
) -> Result<&mut MemoryTable> {
    tables
        .get_mut(&table)
        .ok_or_else(|| StorageError::schema(table, "table does not exist"))
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_table(&self, table: TableName, schema: &TableSchema) -> Result<()> {
        let mut tables = self.tables.write().await;

        match tables.get(&table) {
            Some(current) => current.check_compatible(schema),
            None => {
                tracing::debug!(backend = %self.name, table = %table, "Creating table");
                tables.insert(table, MemoryTable::new(table, schema.clone()));
                Ok(())
            }
        }
    }

    async fn alter_table(
        &self,
        table: TableName,
        schema: &TableSchema,
        if_not_exists: &[&str],
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let added = existing_mut(&mut tables, table)?.add_columns(schema, if_not_exists)?;

        if !added.is_empty() {
            tracing::debug!(backend = %self.name, table = %table, columns = ?added, "Added columns");
        }
        Ok(())
    }

    async fn clear_table(&self, table: TableName) -> Result<()> {
        let mut tables = self.tables.write().await;
        existing_mut(&mut tables, table)?.clear();
        Ok(())
    }

    async fn insert(&self, table: TableName, record: Record) -> Result<()> {
        let mut tables = self.tables.write().await;
        let target = existing_mut(&mut tables, table)?;

        let key = target.validate(&record)?;
        target.upsert(key, record);
        Ok(())
    }

    async fn batch_insert(&self, table: TableName, records: Vec<Record>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let target = existing_mut(&mut tables, table)?;

        let keys = records
            .iter()
            .map(|record| target.validate(record))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(backend = %self.name, table = %table, count = records.len(), "Batch insert");
        for (key, record) in keys.into_iter().zip(records) {
            target.upsert(key, record);
        }
        Ok(())
    }

    async fn insert_new(&self, table: TableName, record: Record) -> Result<()> {
        let mut tables = self.tables.write().await;
        let target = existing_mut(&mut tables, table)?;

        let key = target.validate(&record)?;
        if target.contains_key(&key) {
            return Err(StorageError::already_exists(table, key));
        }
        target.upsert(key, record);
        Ok(())
    }

    async fn batch_insert_new(&self, table: TableName, records: Vec<Record>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let target = existing_mut(&mut tables, table)?;

        let keys = records
            .iter()
            .map(|record| target.validate(record))
            .collect::<Result<Vec<_>>>()?;

        let mut batch = HashSet::new();
        for key in &keys {
            if target.contains_key(key) || !batch.insert(key.as_str()) {
                return Err(StorageError::already_exists(table, key.clone()));
            }
        }

        tracing::debug!(backend = %self.name, table = %table, count = records.len(), "Batch insert of new records");
        for (key, record) in keys.into_iter().zip(records) {
            target.upsert(key, record);
        }
        Ok(())
    }

    async fn load(&self, table: TableName, keys: &Filter) -> Result<Option<Record>> {
        let tables = self.tables.read().await;
        existing(&tables, table)?.load(keys)
    }

    async fn select(&self, table: TableName, filter: &Filter) -> Result<Vec<Record>> {
        let tables = self.tables.read().await;
        Ok(existing(&tables, table)?.select(filter))
    }

    async fn delete(&self, table: TableName, filter: &Filter) -> Result<u64> {
        let mut tables = self.tables.write().await;
        Ok(existing_mut(&mut tables, table)?.delete(filter))
    }
}
