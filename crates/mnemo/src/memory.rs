use std::sync::Arc;

use mnemo_assets::{AssetFetcher, AssetResolver, DownloadError, HttpAssetFetcher, ResolverOptions, SupportedUrls};
use mnemo_message::{FlatMessage, Message, MessageConverter, MessageFormat, WireMessage};
use mnemo_storage::{
    ensure_tables, CompositeStorage, ConversationStore, MemoryBackend, SamplingPolicy, SaveMessages,
    ScoreStore, StorageBackend, StorageDomain, TableName, TraceStore, WorkflowSnapshotStore,
};

use crate::config::MnemoConfig;
use crate::error::{MnemoError, Result};

/// Messages ready to hand to a model, plus the assets that could not be fetched
#[derive(Debug, Clone)]
pub struct PreparedMessages {
    pub messages: Vec<FlatMessage>,
    pub failures: Vec<DownloadError>,
}

/// Result of an ingest call
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub messages: Vec<WireMessage>,
    pub failures: Vec<DownloadError>,
}

/// Entry point wiring storage, domain stores and asset resolution together
#[derive(Clone)]
pub struct Mnemo {
    storage: Arc<CompositeStorage>,
    conversations: ConversationStore,
    scores: ScoreStore,
    traces: TraceStore,
    workflows: WorkflowSnapshotStore,
    resolver: AssetResolver,
    supported: SupportedUrls,
}

impl Mnemo {
    pub fn builder() -> MnemoBuilder {
        MnemoBuilder::new()
    }

    /// Build from configuration with in-memory backends
    pub async fn from_config(config: &MnemoConfig) -> Result<Self> {
        let mut storage = CompositeStorage::builder().default_backend(Arc::new(MemoryBackend::named("shared")));
        for &domain in &config.storage.dedicated {
            storage = storage.domain(domain, Arc::new(MemoryBackend::named(domain.as_str())));
        }

        Self::builder()
            .storage(storage.build()?)
            .resolver_options(config.assets.resolver_options())
            .supported_urls(config.assets.supported_urls()?)
            .sampling(config.scores.sampling)
            .build()
            .await
    }

    pub fn storage(&self) -> &Arc<CompositeStorage> {
        &self.storage
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    pub fn traces(&self) -> &TraceStore {
        &self.traces
    }

    pub fn workflows(&self) -> &WorkflowSnapshotStore {
        &self.workflows
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    /// Normalize, optionally materialize remote assets, then persist
    ///
    /// With `materialize` set, remote references the model cannot read
    /// natively are downloaded and stored inline. References that fail to
    /// download stay remote and are reported in the outcome.
    pub async fn ingest(&self, input: SaveMessages, materialize: bool) -> Result<IngestOutcome> {
        if !materialize {
            let messages = self.conversations.save_messages(input).await?;
            return Ok(IngestOutcome {
                messages,
                failures: Vec::new(),
            });
        }

        let converter = MessageConverter::new();
        let canonical = input
            .messages
            .iter()
            .map(|message| converter.to_canonical(message))
            .collect::<std::result::Result<Vec<Message>, _>>()?;

        let resolution = self.resolver.resolve(&canonical, &self.supported).await;
        let with_assets = MessageConverter::with_assets(&resolution.assets);
        let inlined = canonical
            .into_iter()
            .map(|message| with_assets.to_canonical(&WireMessage::Structured(message)).map(WireMessage::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let messages = self
            .conversations
            .save_messages(SaveMessages {
                messages: inlined,
                format: input.format,
            })
            .await?;

        Ok(IngestOutcome {
            messages,
            failures: resolution.failures,
        })
    }

    /// Load a thread's recent history as flat messages with remote assets inlined
    pub async fn prepare_for_model(&self, thread_id: &str, last: usize) -> Result<PreparedMessages> {
        let history: Vec<Message> = self
            .conversations
            .get_last_messages(thread_id, last, MessageFormat::Structured)
            .await?
            .into_iter()
            .filter_map(|message| match message {
                WireMessage::Structured(message) => Some(message),
                WireMessage::Flat(_) => None,
            })
            .collect();

        let resolution = self.resolver.resolve(&history, &self.supported).await;
        let converter = MessageConverter::with_assets(&resolution.assets);
        let messages = history
            .iter()
            .map(|message| converter.to_flat(message))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(
            thread_id,
            messages = messages.len(),
            downloaded = resolution.assets.len(),
            failed = resolution.failures.len(),
            "Prepared messages for model"
        );

        Ok(PreparedMessages {
            messages,
            failures: resolution.failures,
        })
    }
}

pub struct MnemoBuilder {
    storage: Option<CompositeStorage>,
    fetcher: Option<Arc<dyn AssetFetcher>>,
    resolver_options: ResolverOptions,
    supported: SupportedUrls,
    sampling: SamplingPolicy,
}

impl MnemoBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            fetcher: None,
            resolver_options: ResolverOptions::default(),
            supported: SupportedUrls::default(),
            sampling: SamplingPolicy::default(),
        }
    }

    pub fn storage(mut self, storage: CompositeStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn resolver_options(mut self, options: ResolverOptions) -> Self {
        self.resolver_options = options;
        self
    }

    pub fn supported_urls(mut self, supported: SupportedUrls) -> Self {
        self.supported = supported;
        self
    }

    pub fn sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    /// Create every table on its backend and assemble the stores
    pub async fn build(self) -> Result<Mnemo> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => CompositeStorage::builder()
                .default_backend(Arc::new(MemoryBackend::new()))
                .build()?,
        };
        let storage = Arc::new(storage);
        ensure_tables(storage.as_ref(), &TableName::ALL).await?;

        for domain in StorageDomain::ALL {
            let backend = storage.domain_backend(domain)?;
            tracing::info!(domain = %domain, backend = backend.name(), "Storage domain ready");
        }

        let fetcher: Arc<dyn AssetFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                HttpAssetFetcher::with_timeout(self.resolver_options.timeout).map_err(MnemoError::Fetcher)?,
            ),
        };

        let backend: Arc<dyn StorageBackend> = storage.clone();
        Ok(Mnemo {
            conversations: ConversationStore::new(backend.clone()),
            scores: ScoreStore::new(backend.clone()).with_sampling(self.sampling),
            traces: TraceStore::new(backend.clone()),
            workflows: WorkflowSnapshotStore::new(backend),
            resolver: AssetResolver::with_options(fetcher, self.resolver_options),
            supported: self.supported,
            storage,
        })
    }
}

impl Default for MnemoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
