use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::error::Result;
use crate::models::TraceSpan;
use crate::pagination::{Page, Pagination};
use crate::record::{from_record, to_record, Filter};
use crate::schema::TableName;

use super::decode_all;

/// Filters for listing spans; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct TraceQuery {
    pub name_prefix: Option<String>,
    pub trace_id: Option<String>,
    pub run_id: Option<String>,
    pub scope: Option<String>,
    pub pagination: Pagination,
}

impl TraceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(trace_id) = &self.trace_id {
            filter = filter.eq("traceId", trace_id.as_str());
        }
        if let Some(run_id) = &self.run_id {
            filter = filter.eq("runId", run_id.as_str());
        }
        if let Some(scope) = &self.scope {
            filter = filter.eq("scope", scope.as_str());
        }
        filter
    }
}

/// Append-only execution spans
#[derive(Clone)]
pub struct TraceStore {
    backend: Arc<dyn StorageBackend>,
}

impl TraceStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Insert spans in one batch; spans are never overwritten
    pub async fn batch_insert_spans(&self, spans: Vec<TraceSpan>) -> Result<()> {
        if spans.is_empty() {
            return Ok(());
        }

        let count = spans.len();
        let records = spans.iter().map(to_record).collect::<Result<Vec<_>>>()?;
        self.backend.batch_insert_new(TableName::Traces, records).await?;

        tracing::debug!(count, "Inserted trace spans");
        Ok(())
    }

    pub async fn get_span(&self, id: &str) -> Result<Option<TraceSpan>> {
        self.backend
            .load(TableName::Traces, &Filter::by("id", id))
            .await?
            .map(from_record)
            .transpose()
    }

    /// Matching spans, newest first
    pub async fn get_traces(&self, query: TraceQuery) -> Result<Page<TraceSpan>> {
        query.pagination.validate()?;

        let records = self.backend.select(TableName::Traces, &query.filter()).await?;
        let mut spans: Vec<TraceSpan> = decode_all(records)?;

        if let Some(prefix) = &query.name_prefix {
            spans.retain(|span| span.name.starts_with(prefix.as_str()));
        }
        spans.reverse();
        spans.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Page::paginate(spans, query.pagination)
    }
}
