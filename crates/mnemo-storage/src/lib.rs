pub mod backend;
pub mod builder;
pub mod dbs;
pub mod error;
pub mod models;
pub mod pagination;
pub mod record;
pub mod repositories;
pub mod router;
pub mod sampling;
pub mod schema;

pub use backend::{ensure_tables, StorageBackend};
pub use builder::CompositeStorageBuilder;
pub use dbs::memory::MemoryBackend;
pub use error::{Result, StorageError};
pub use models::{
    GetMessages, Metadata, Resource, SaveMessages, Score, ScoreSource, SortDirection, SpanKind, SpanStatus,
    SpanStatusCode, Thread, ThreadOrder, ThreadOrderField, TraceSpan, UpdateResource, UpdateThread,
    WorkflowSnapshot,
};
pub use pagination::{Page, Pagination};
pub use record::{Filter, Record};
pub use repositories::{
    ConversationStore, ScoreStore, TraceQuery, TraceStore, WorkflowRunQuery, WorkflowSnapshotStore,
};
pub use router::CompositeStorage;
pub use sampling::SamplingPolicy;
pub use schema::{table_schema, ColumnDef, ColumnType, StorageDomain, TableName, TableSchema};
