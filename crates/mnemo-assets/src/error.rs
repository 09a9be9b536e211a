use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Invalid supported-url pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A URL that could not be fetched within its retry budget
///
/// Reported alongside the assets that did resolve; never returned as `Err`
/// from a resolution call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to download {url} after {attempts} attempt(s): {reason}")]
pub struct DownloadError {
    pub url: String,
    pub attempts: u32,
    pub reason: String,
}
