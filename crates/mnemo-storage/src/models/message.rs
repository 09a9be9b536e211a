use mnemo_message::{MessageFormat, WireMessage};
use serde::{Deserialize, Serialize};

use crate::pagination::Pagination;

/// Messages to persist and the format the stored result is returned in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessages {
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub format: MessageFormat,
}

impl SaveMessages {
    pub fn new(messages: impl IntoIterator<Item = impl Into<WireMessage>>) -> Self {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            format: MessageFormat::default(),
        }
    }

    pub fn format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessages {
    pub thread_id: String,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub format: MessageFormat,
}

impl GetMessages {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            pagination: Pagination::default(),
            format: MessageFormat::default(),
        }
    }

    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    pub fn format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }
}
