use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical tables consumed by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Threads,
    Messages,
    Resources,
    Traces,
    WorkflowSnapshots,
    Scores,
}

impl TableName {
    pub const ALL: [TableName; 6] = [
        TableName::Threads,
        TableName::Messages,
        TableName::Resources,
        TableName::Traces,
        TableName::WorkflowSnapshots,
        TableName::Scores,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threads => "mnemo_threads",
            Self::Messages => "mnemo_messages",
            Self::Resources => "mnemo_resources",
            Self::Traces => "mnemo_traces",
            Self::WorkflowSnapshots => "mnemo_workflow_snapshots",
            Self::Scores => "mnemo_scores",
        }
    }

    /// Domain whose backend owns this table
    pub fn domain(&self) -> StorageDomain {
        match self {
            Self::Threads | Self::Messages | Self::Resources => StorageDomain::Conversations,
            Self::Traces => StorageDomain::Traces,
            Self::WorkflowSnapshots => StorageDomain::Workflows,
            Self::Scores => StorageDomain::Scores,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of backend routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageDomain {
    Traces,
    Conversations,
    Workflows,
    Scores,
}

impl StorageDomain {
    pub const ALL: [StorageDomain; 4] = [
        StorageDomain::Traces,
        StorageDomain::Conversations,
        StorageDomain::Workflows,
        StorageDomain::Scores,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traces => "traces",
            Self::Conversations => "conversations",
            Self::Workflows => "workflows",
            Self::Scores => "scores",
        }
    }

    pub fn tables(&self) -> &'static [TableName] {
        match self {
            Self::Traces => &[TableName::Traces],
            Self::Conversations => &[TableName::Threads, TableName::Messages, TableName::Resources],
            Self::Workflows => &[TableName::WorkflowSnapshots],
            Self::Scores => &[TableName::Scores],
        }
    }
}

impl fmt::Display for StorageDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    /// RFC 3339 string
    Timestamp,
    /// Any JSON value
    Json,
}

impl ColumnType {
    /// Whether a non-null value fits this column
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Timestamp => value
                .as_str()
                .map_or(false, |s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            Self::Json => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub indexed: bool,
}

impl ColumnDef {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: false,
            primary_key: false,
            indexed: false,
        }
    }

    pub fn text() -> Self {
        Self::new(ColumnType::Text)
    }

    pub fn timestamp() -> Self {
        Self::new(ColumnType::Timestamp)
    }

    pub fn json() -> Self {
        Self::new(ColumnType::Json)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Two declarations of the same column agree on type, nullability and key role
    pub fn is_compatible(&self, other: &ColumnDef) -> bool {
        self.column_type == other.column_type
            && self.nullable == other.nullable
            && self.primary_key == other.primary_key
    }
}

/// `{columnName: {type, nullable}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: BTreeMap<String, ColumnDef>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, def: ColumnDef) -> Self {
        self.columns.insert(name.into(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.columns.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn primary_key(&self) -> Vec<&str> {
        self.columns()
            .filter(|(_, def)| def.primary_key)
            .map(|(name, _)| name)
            .collect()
    }

    pub(crate) fn insert_column(&mut self, name: &str, def: ColumnDef) {
        self.columns.insert(name.to_string(), def);
    }
}

/// Current schema of each logical table
pub fn table_schema(table: TableName) -> TableSchema {
    match table {
        TableName::Threads => TableSchema::new()
            .column("id", ColumnDef::text().primary_key())
            .column("resourceId", ColumnDef::text().indexed())
            .column("title", ColumnDef::text().nullable())
            .column("metadata", ColumnDef::json().nullable())
            .column("createdAt", ColumnDef::timestamp())
            .column("updatedAt", ColumnDef::timestamp()),

        TableName::Messages => TableSchema::new()
            .column("id", ColumnDef::text().primary_key())
            .column("threadId", ColumnDef::text().indexed())
            .column("resourceId", ColumnDef::text().nullable())
            .column("role", ColumnDef::text())
            .column("content", ColumnDef::json())
            .column("createdAt", ColumnDef::timestamp()),

        TableName::Resources => TableSchema::new()
            .column("id", ColumnDef::text().primary_key())
            .column("workingMemory", ColumnDef::text().nullable())
            .column("metadata", ColumnDef::json().nullable())
            .column("createdAt", ColumnDef::timestamp())
            .column("updatedAt", ColumnDef::timestamp()),

        TableName::Traces => TableSchema::new()
            .column("id", ColumnDef::text().primary_key())
            .column("traceId", ColumnDef::text().indexed())
            .column("runId", ColumnDef::text().nullable().indexed())
            .column("parentSpanId", ColumnDef::text().nullable())
            .column("name", ColumnDef::text())
            .column("scope", ColumnDef::text().nullable())
            .column("kind", ColumnDef::text())
            .column("attributes", ColumnDef::json().nullable())
            .column("status", ColumnDef::json().nullable())
            .column("startTime", ColumnDef::timestamp())
            .column("endTime", ColumnDef::timestamp().nullable())
            .column("createdAt", ColumnDef::timestamp()),

        TableName::WorkflowSnapshots => TableSchema::new()
            .column("workflowName", ColumnDef::text().primary_key().indexed())
            .column("runId", ColumnDef::text().primary_key())
            .column("resourceId", ColumnDef::text().nullable())
            .column("snapshot", ColumnDef::json())
            .column("createdAt", ColumnDef::timestamp())
            .column("updatedAt", ColumnDef::timestamp()),

        TableName::Scores => TableSchema::new()
            .column("id", ColumnDef::text().primary_key())
            .column("scorerId", ColumnDef::text().indexed())
            .column("runId", ColumnDef::text().indexed())
            .column("entityId", ColumnDef::text().indexed())
            .column("entityType", ColumnDef::text())
            .column("score", ColumnDef::new(ColumnType::Float))
            .column("reason", ColumnDef::text().nullable())
            .column("input", ColumnDef::json().nullable())
            .column("output", ColumnDef::json().nullable())
            .column("metadata", ColumnDef::json().nullable())
            .column("source", ColumnDef::text())
            .column("createdAt", ColumnDef::timestamp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_has_a_primary_key() {
        for table in TableName::ALL {
            assert!(!table_schema(table).primary_key().is_empty(), "{} has no key", table);
        }
    }

    #[test]
    fn test_domains_cover_all_tables() {
        let mut covered: Vec<TableName> = StorageDomain::ALL
            .iter()
            .flat_map(|domain| domain.tables().iter().copied())
            .collect();
        covered.sort();
        let mut all = TableName::ALL.to_vec();
        all.sort();
        assert_eq!(covered, all);
    }

    #[test]
    fn test_schema_serializes_as_column_map() {
        let schema = TableSchema::new().column("id", ColumnDef::text().primary_key());
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["id"]["type"], "text");
        assert_eq!(json["id"]["nullable"], false);
    }

    #[test]
    fn test_timestamp_column_accepts_rfc3339() {
        assert!(ColumnType::Timestamp.accepts(&Value::from("2024-05-01T10:00:00.123Z")));
        assert!(!ColumnType::Timestamp.accepts(&Value::from("yesterday")));
    }
}
