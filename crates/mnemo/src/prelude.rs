//! Prelude module for convenient imports
//!
//! ```rust
//! use mnemo::prelude::*;
//! ```

pub use crate::{
    init_logging, Mnemo, MnemoBuilder, MnemoConfig, MnemoError,
    Content, ContentPart, FlatMessage, Message, MessageFormat, MessageRole, WireMessage,
    CompositeStorage, ConversationStore, GetMessages, MemoryBackend, Pagination, SaveMessages,
    StorageBackend, Thread, UpdateResource, UpdateThread,
    AssetResolver, SupportedUrls,
};
