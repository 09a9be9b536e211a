use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::thread::null_as_empty;
use super::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    #[default]
    Live,
    Test,
}

/// Evaluation result, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: String,
    pub scorer_id: String,
    pub run_id: String,
    pub entity_id: String,
    pub entity_type: String,
    pub score: f64,
    pub reason: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
    #[serde(default)]
    pub source: ScoreSource,
    pub created_at: DateTime<Utc>,
}

impl Score {
    pub fn new(
        scorer_id: impl Into<String>,
        run_id: impl Into<String>,
        entity_id: impl Into<String>,
        entity_type: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            scorer_id: scorer_id.into(),
            run_id: run_id.into(),
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            score,
            reason: None,
            input: None,
            output: None,
            metadata: Metadata::new(),
            source: ScoreSource::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_source(mut self, source: ScoreSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
