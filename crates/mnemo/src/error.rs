use mnemo_assets::AssetError;
use mnemo_message::ConvertError;
use mnemo_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MnemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Message conversion error: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Asset configuration error: {0}")]
    Assets(#[from] AssetError),

    #[error("Failed to initialize asset fetcher: {0:#}")]
    Fetcher(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MnemoError>;
