use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use mnemo_assets::{AssetError, ResolverOptions, SupportedUrls};
use mnemo_storage::{SamplingPolicy, StorageDomain};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MnemoConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub scores: ScoresConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Domains that get their own in-memory backend instead of the shared one
    #[serde(default)]
    pub dedicated: Vec<StorageDomain>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Media pattern → URL regexes the model reads natively
    #[serde(default)]
    pub supported_urls: BTreeMap<String, Vec<String>>,
}

fn default_concurrency() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            supported_urls: BTreeMap::new(),
        }
    }
}

impl AssetsConfig {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            concurrency: self.concurrency,
            max_attempts: self.max_attempts,
            timeout: Duration::from_millis(self.timeout_ms),
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn supported_urls(&self) -> Result<SupportedUrls, AssetError> {
        SupportedUrls::from_patterns(self.supported_urls.clone())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoresConfig {
    #[serde(default)]
    pub sampling: SamplingPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl MnemoConfig {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. config/mnemo.toml
    /// 3. config/mnemo.{ENV}.toml (ENV defaults to "dev")
    /// 4. `MNEMO_*` environment variables, `__` between sections
    ///    (e.g. `MNEMO_ASSETS__CONCURRENCY=4`)
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/mnemo").required(false))
            .add_source(File::with_name(&format!("config/mnemo.{}", env)).required(false))
            .add_source(
                Environment::with_prefix("MNEMO")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.dedicated"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}
