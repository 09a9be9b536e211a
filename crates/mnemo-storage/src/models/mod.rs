pub mod message;
pub mod resource;
pub mod score;
pub mod thread;
pub mod trace;
pub mod workflow;

pub use message::{GetMessages, SaveMessages};
pub use resource::{Resource, UpdateResource};
pub use score::{Score, ScoreSource};
pub use thread::{SortDirection, Thread, ThreadOrder, ThreadOrderField, UpdateThread};
pub use trace::{SpanKind, SpanStatus, SpanStatusCode, TraceSpan};
pub use workflow::WorkflowSnapshot;

use chrono::{DateTime, Duration, Utc};

/// Metadata attached to threads, resources and scores
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Next `updatedAt` value: now, but always strictly after `previous`
pub(crate) fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Shallow merge: keys in `patch` win, everything else is kept
pub(crate) fn merge_metadata(base: &mut Metadata, patch: Metadata) {
    for (key, value) in patch {
        base.insert(key, value);
    }
}
