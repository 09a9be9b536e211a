pub mod conversation;
pub mod score;
pub mod trace;
pub mod workflow;

pub use conversation::ConversationStore;
pub use score::ScoreStore;
pub use trace::{TraceQuery, TraceStore};
pub use workflow::{WorkflowRunQuery, WorkflowSnapshotStore};

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::record::{from_record, Record};

fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(from_record).collect()
}
