//! # Mnemo
//!
//! Conversation memory for AI agents: threads, long-lived resource profiles,
//! multimodal messages and append-only scores and traces, stored on
//! interchangeable backends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mnemo::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MnemoConfig::load()?;
//!     init_logging(&config.logging).ok();
//!
//!     let mnemo = Mnemo::from_config(&config).await?;
//!
//!     mnemo
//!         .conversations()
//!         .save_messages(SaveMessages::new(vec![
//!             FlatMessage::user("thread-1", "Hello!").with_resource_id("user-42"),
//!         ]))
//!         .await?;
//!
//!     let prepared = mnemo.prepare_for_model("thread-1", 20).await?;
//!     println!("{} messages ready", prepared.messages.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`mnemo-message`**: wire formats, content normalization, media-type sniffing
//! - **`mnemo-storage`**: backend contract, in-memory backend, routing, domain stores
//! - **`mnemo-assets`**: bounded-concurrency download of remote assets
//!
//! ## License
//!
//! MIT

pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod prelude;

pub use config::{AssetsConfig, LogFormat, LoggingConfig, MnemoConfig, ScoresConfig, StorageConfig};
pub use error::{MnemoError, Result};
pub use logging::init_logging;
pub use memory::{IngestOutcome, Mnemo, MnemoBuilder, PreparedMessages};

pub use mnemo_message::{
    Content, ContentPart, ConvertError, DataContent, DownloadedAsset, DownloadedAssets, FlatMessage,
    Message, MessageConverter, MessageFormat, MessageRole, RemoteUrl, StructuredContent, UiPart,
    WireMessage,
};

pub use mnemo_storage::{
    CompositeStorage, CompositeStorageBuilder, ConversationStore, GetMessages, MemoryBackend, Page,
    Pagination, Resource, SamplingPolicy, SaveMessages, Score, ScoreStore, StorageBackend,
    StorageDomain, StorageError, TableName, Thread, ThreadOrder, TraceQuery, TraceSpan, TraceStore,
    UpdateResource, UpdateThread, WorkflowRunQuery, WorkflowSnapshot, WorkflowSnapshotStore,
};

pub use mnemo_assets::{
    AssetFetcher, AssetResolution, AssetResolver, DownloadError, HttpAssetFetcher, ResolverOptions,
    SupportedUrls,
};
