use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::backend::StorageBackend;
use crate::error::Result;
use crate::models::{advance, WorkflowSnapshot};
use crate::pagination::{Page, Pagination};
use crate::record::{from_record, to_record, Filter};
use crate::schema::TableName;

use super::decode_all;

#[derive(Debug, Clone, Default)]
pub struct WorkflowRunQuery {
    pub workflow_name: Option<String>,
    pub resource_id: Option<String>,
    pub pagination: Pagination,
}

impl WorkflowRunQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = Some(name.into());
        self
    }

    pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }
}

/// Workflow run snapshots keyed by `(workflowName, runId)`
#[derive(Clone)]
pub struct WorkflowSnapshotStore {
    backend: Arc<dyn StorageBackend>,
}

impl WorkflowSnapshotStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Upsert a run's snapshot, keeping the first `createdAt`
    pub async fn persist_snapshot(
        &self,
        workflow_name: &str,
        run_id: &str,
        resource_id: Option<&str>,
        snapshot: Value,
    ) -> Result<WorkflowSnapshot> {
        let stored = match self.load_snapshot(workflow_name, run_id).await? {
            Some(previous) => WorkflowSnapshot {
                resource_id: resource_id.map(str::to_string).or(previous.resource_id),
                snapshot,
                updated_at: advance(previous.updated_at),
                ..previous
            },
            None => {
                let now = Utc::now();
                WorkflowSnapshot {
                    workflow_name: workflow_name.to_string(),
                    run_id: run_id.to_string(),
                    resource_id: resource_id.map(str::to_string),
                    snapshot,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        self.backend
            .insert(TableName::WorkflowSnapshots, to_record(&stored)?)
            .await?;
        tracing::debug!(workflow_name, run_id, "Persisted workflow snapshot");
        Ok(stored)
    }

    pub async fn load_snapshot(&self, workflow_name: &str, run_id: &str) -> Result<Option<WorkflowSnapshot>> {
        let keys = Filter::by("workflowName", workflow_name).eq("runId", run_id);
        self.backend
            .load(TableName::WorkflowSnapshots, &keys)
            .await?
            .map(from_record)
            .transpose()
    }

    /// Runs matching the query, most recently updated first
    pub async fn list_runs(&self, query: WorkflowRunQuery) -> Result<Page<WorkflowSnapshot>> {
        query.pagination.validate()?;

        let mut filter = Filter::new();
        if let Some(name) = &query.workflow_name {
            filter = filter.eq("workflowName", name.as_str());
        }
        if let Some(resource_id) = &query.resource_id {
            filter = filter.eq("resourceId", resource_id.as_str());
        }

        let records = self.backend.select(TableName::WorkflowSnapshots, &filter).await?;
        let mut runs: Vec<WorkflowSnapshot> = decode_all(records)?;
        // Newest first; ties favour the later insert
        runs.reverse();
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Page::paginate(runs, query.pagination)
    }
}
