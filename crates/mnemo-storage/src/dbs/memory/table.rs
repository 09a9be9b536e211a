use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::error::{Result, StorageError};
use crate::record::{Filter, Record};
use crate::schema::{ColumnDef, TableName, TableSchema};

const KEY_SEPARATOR: char = '\u{1f}';

/// Rows of one table, ordered by insertion sequence
///
/// Upserting an existing key keeps its original sequence number so read
/// order stays stable across updates.
#[derive(Debug)]
pub(crate) struct MemoryTable {
    name: TableName,
    schema: TableSchema,
    rows: BTreeMap<u64, Record>,
    keys: HashMap<String, u64>,
    /// column → encoded value → row sequences
    indexes: HashMap<String, HashMap<String, BTreeSet<u64>>>,
    next_seq: u64,
}

impl MemoryTable {
    pub(crate) fn new(name: TableName, schema: TableSchema) -> Self {
        let indexes = schema
            .columns()
            .filter(|(_, def)| def.indexed)
            .map(|(column, _)| (column.to_string(), HashMap::new()))
            .collect();

        Self {
            name,
            schema,
            rows: BTreeMap::new(),
            keys: HashMap::new(),
            indexes,
            next_seq: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Every requested column must already exist with the same definition
    pub(crate) fn check_compatible(&self, requested: &TableSchema) -> Result<()> {
        for (column, def) in requested.columns() {
            match self.schema.get(column) {
                Some(existing) if existing.is_compatible(def) => {}
                Some(existing) => {
                    return Err(StorageError::schema(
                        self.name,
                        format!(
                            "column '{}' is declared as {:?} but exists as {:?}",
                            column, def, existing
                        ),
                    ))
                }
                None => {
                    return Err(StorageError::schema(
                        self.name,
                        format!("existing table has no column '{}'", column),
                    ))
                }
            }
        }
        Ok(())
    }

    pub(crate) fn add_columns(&mut self, schema: &TableSchema, columns: &[&str]) -> Result<Vec<String>> {
        let mut pending: Vec<(&str, ColumnDef)> = Vec::new();

        for &column in columns {
            let def = schema.get(column).ok_or_else(|| {
                StorageError::schema(self.name, format!("column '{}' is not part of the supplied schema", column))
            })?;

            match self.schema.get(column) {
                Some(existing) if existing.is_compatible(def) => continue,
                Some(existing) => {
                    return Err(StorageError::schema(
                        self.name,
                        format!("cannot redefine column '{}' from {:?} to {:?}", column, existing, def),
                    ))
                }
                None if def.primary_key => {
                    return Err(StorageError::schema(
                        self.name,
                        format!("cannot add primary key column '{}'", column),
                    ))
                }
                None if !def.nullable && !self.rows.is_empty() => {
                    return Err(StorageError::schema(
                        self.name,
                        format!("cannot add non-nullable column '{}' to a populated table", column),
                    ))
                }
                None => pending.push((column, *def)),
            }
        }

        // Validated as a whole before anything changes
        let mut added = Vec::with_capacity(pending.len());
        for (column, def) in pending {
            self.schema.insert_column(column, def);
            if def.indexed {
                self.indexes.entry(column.to_string()).or_default();
            }
            added.push(column.to_string());
        }
        Ok(added)
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
        self.keys.clear();
        for index in self.indexes.values_mut() {
            index.clear();
        }
    }

    /// Check a record against the schema and compute its primary key
    pub(crate) fn validate(&self, record: &Record) -> Result<String> {
        for (column, value) in record {
            let def = self.schema.get(column).ok_or_else(|| {
                StorageError::schema(self.name, format!("unknown column '{}'", column))
            })?;

            if value.is_null() {
                if !def.nullable {
                    return Err(StorageError::schema(self.name, format!("column '{}' is not nullable", column)));
                }
            } else if !def.column_type.accepts(value) {
                return Err(StorageError::schema(
                    self.name,
                    format!("value for column '{}' is not a valid {:?}", column, def.column_type),
                ));
            }
        }

        for (column, def) in self.schema.columns() {
            if !def.nullable && !record.contains_key(column) {
                return Err(StorageError::schema(self.name, format!("missing required column '{}'", column)));
            }
        }

        self.key_of(|column| record.get(column))
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Store an already validated record
    pub(crate) fn upsert(&mut self, key: String, record: Record) {
        let seq = match self.keys.get(&key) {
            Some(&seq) => {
                if let Some(previous) = self.rows.remove(&seq) {
                    self.unindex(seq, &previous);
                }
                seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.keys.insert(key, seq);
                seq
            }
        };

        self.index(seq, &record);
        self.rows.insert(seq, record);
    }

    pub(crate) fn load(&self, keys: &Filter) -> Result<Option<Record>> {
        let key = self.key_of(|column| keys.get(column))?;
        Ok(self
            .keys
            .get(&key)
            .and_then(|seq| self.rows.get(seq))
            .cloned())
    }

    pub(crate) fn select(&self, filter: &Filter) -> Vec<Record> {
        self.matching(filter)
            .into_iter()
            .filter_map(|seq| self.rows.get(&seq).cloned())
            .collect()
    }

    pub(crate) fn delete(&mut self, filter: &Filter) -> u64 {
        let doomed = self.matching(filter);
        let mut removed = 0;

        for seq in doomed {
            if let Some(record) = self.rows.remove(&seq) {
                self.unindex(seq, &record);
                match self.key_of(|column| record.get(column)) {
                    Ok(key) => {
                        self.keys.remove(&key);
                    }
                    Err(_) => self.keys.retain(|_, candidate| *candidate != seq),
                }
                removed += 1;
            }
        }
        removed
    }

    /// Sequences of rows matching `filter`, in insertion order
    fn matching(&self, filter: &Filter) -> Vec<u64> {
        let indexed = filter.conditions().iter().find_map(|(column, value)| {
            if value.is_null() {
                return None;
            }
            self.indexes.get(column).map(|index| index.get(&encode(value)))
        });

        let candidates: Box<dyn Iterator<Item = u64> + '_> = match indexed {
            Some(Some(seqs)) => Box::new(seqs.iter().copied()),
            Some(None) => return Vec::new(),
            None => Box::new(self.rows.keys().copied()),
        };

        candidates
            .filter(|seq| self.rows.get(seq).map_or(false, |record| filter.matches(record)))
            .collect()
    }

    fn key_of<'r>(&self, lookup: impl Fn(&str) -> Option<&'r Value>) -> Result<String> {
        let mut parts = Vec::new();
        for column in self.schema.primary_key() {
            match lookup(column) {
                Some(value) if !value.is_null() => parts.push(encode(value)),
                _ => {
                    return Err(StorageError::schema(
                        self.name,
                        format!("missing primary key column '{}'", column),
                    ))
                }
            }
        }
        Ok(parts.join(&KEY_SEPARATOR.to_string()))
    }

    fn index(&mut self, seq: u64, record: &Record) {
        for (column, index) in self.indexes.iter_mut() {
            if let Some(value) = record.get(column).filter(|v| !v.is_null()) {
                index.entry(encode(value)).or_default().insert(seq);
            }
        }
    }

    fn unindex(&mut self, seq: u64, record: &Record) {
        for (column, index) in self.indexes.iter_mut() {
            if let Some(value) = record.get(column) {
                let encoded = encode(value);
                if let Some(seqs) = index.get_mut(&encoded) {
                    seqs.remove(&seq);
                    if seqs.is_empty() {
                        index.remove(&encoded);
                    }
                }
            }
        }
    }
}

fn encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
