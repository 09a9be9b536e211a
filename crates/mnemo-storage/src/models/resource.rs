use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thread::null_as_empty;
use super::{advance, merge_metadata, Metadata};

/// Long-lived profile owning threads and carrying working memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub working_memory: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Lazily created profile: empty metadata, no working memory
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            working_memory: None,
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place
    ///
    /// `createdAt` is left alone and `updatedAt` always moves forward.
    pub(crate) fn apply(&mut self, update: UpdateResource) {
        if let Some(working_memory) = update.working_memory {
            self.working_memory = Some(working_memory);
        }
        if let Some(metadata) = update.metadata {
            merge_metadata(&mut self.metadata, metadata);
        }
        self.updated_at = advance(self.updated_at);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResource {
    pub resource_id: String,
    /// Replaces the stored value only when present
    pub working_memory: Option<String>,
    /// Shallow-merged into the stored metadata
    pub metadata: Option<Metadata>,
}

impl UpdateResource {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ..Default::default()
        }
    }

    pub fn working_memory(mut self, working_memory: impl Into<String>) -> Self {
        self.working_memory = Some(working_memory.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
