use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thread::null_as_empty;
use super::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    #[default]
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatusCode {
    #[default]
    Unset,
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStatus {
    pub code: SpanStatusCode,
    pub message: Option<String>,
}

/// One execution span, append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSpan {
    pub id: String,
    pub trace_id: String,
    pub run_id: Option<String>,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub scope: Option<String>,
    #[serde(default)]
    pub kind: SpanKind,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Metadata,
    pub status: Option<SpanStatus>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TraceSpan {
    pub fn new(trace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            trace_id: trace_id.into(),
            run_id: None,
            parent_span_id: None,
            name: name.into(),
            scope: None,
            kind: SpanKind::default(),
            attributes: Metadata::new(),
            status: None,
            start_time: now,
            end_time: None,
            created_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Close the span with the given status
    pub fn finish(mut self, code: SpanStatusCode, message: Option<String>) -> Self {
        self.end_time = Some(Utc::now());
        self.status = Some(SpanStatus { code, message });
        self
    }
}
