use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use super::content::{Content, StructuredContent};

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Wire format a caller wants messages in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// `content` is a string or a part list
    Flat,
    /// `content` is `{format: 2, parts}`
    #[default]
    Structured,
}

/// Message in the flat wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatMessage {
    #[serde(default = "generate_id")]
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub role: MessageRole,
    pub content: Content,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl FlatMessage {
    pub fn new(thread_id: impl Into<String>, role: MessageRole, content: impl Into<Content>) -> Self {
        Self {
            id: generate_id(),
            thread_id: thread_id.into(),
            resource_id: None,
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(thread_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self::new(thread_id, MessageRole::User, content)
    }

    pub fn assistant(thread_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self::new(thread_id, MessageRole::Assistant, content)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Canonical message
///
/// Serializes as the structured wire format, which is also the form the
/// storage layer persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "generate_id")]
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub role: MessageRole,
    pub content: StructuredContent,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(thread_id: impl Into<String>, role: MessageRole, content: StructuredContent) -> Self {
        Self {
            id: generate_id(),
            thread_id: thread_id.into(),
            resource_id: None,
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A message in either wire format, as received from a client
///
/// The shape of `content` picks the format: an object is structured, a
/// string or an array is flat. Errors from the chosen format are reported
/// as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireMessage {
    Structured(Message),
    Flat(FlatMessage),
}

impl<'de> Deserialize<'de> for WireMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let structured = value.get("content").map_or(false, serde_json::Value::is_object);

        if structured {
            serde_json::from_value(value)
                .map(Self::Structured)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Self::Flat)
                .map_err(de::Error::custom)
        }
    }
}

impl WireMessage {
    pub fn id(&self) -> &str {
        match self {
            Self::Structured(m) => &m.id,
            Self::Flat(m) => &m.id,
        }
    }

    pub fn thread_id(&self) -> &str {
        match self {
            Self::Structured(m) => &m.thread_id,
            Self::Flat(m) => &m.thread_id,
        }
    }

    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::Structured(m) => m.resource_id.as_deref(),
            Self::Flat(m) => m.resource_id.as_deref(),
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Self::Structured(m) => m.role,
            Self::Flat(m) => m.role,
        }
    }

    pub fn format(&self) -> MessageFormat {
        match self {
            Self::Structured(_) => MessageFormat::Structured,
            Self::Flat(_) => MessageFormat::Flat,
        }
    }

    pub fn as_flat(&self) -> Option<&FlatMessage> {
        match self {
            Self::Flat(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Message> {
        match self {
            Self::Structured(m) => Some(m),
            _ => None,
        }
    }
}

impl From<FlatMessage> for WireMessage {
    fn from(message: FlatMessage) -> Self {
        Self::Flat(message)
    }
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        Self::Structured(message)
    }
}
