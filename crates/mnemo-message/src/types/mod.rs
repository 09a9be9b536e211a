pub mod content;
pub mod data;
pub mod message;

pub use content::{Content, ContentPart, StructuredContent, UiPart, STRUCTURED_FORMAT_VERSION};
pub use data::{DataContent, RemoteUrl};
pub use message::{FlatMessage, Message, MessageFormat, MessageRole, WireMessage};
