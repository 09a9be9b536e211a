use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use mnemo_message::{
    collect_remote_references, DownloadedAsset, DownloadedAssets, Message, RemoteReference, RemoteUrl,
};

use crate::error::DownloadError;
use crate::fetcher::AssetFetcher;
use crate::supported::SupportedUrls;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Fetches in flight at once
    pub concurrency: usize,
    /// Total attempts per URL, first one included
    pub max_attempts: u32,
    /// Budget for a single attempt
    pub timeout: Duration,
    /// Delay before the second attempt; doubles after each failure
    pub retry_base_delay: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

/// Outcome of one resolution call
///
/// `assets` is keyed by the reference string exactly as it appeared in the
/// message and only holds successful
/// downloads. Callers needing completeness check `failures` or look for
/// missing keys.
#[derive(Debug, Clone, Default)]
pub struct AssetResolution {
    pub assets: DownloadedAssets,
    pub failures: Vec<DownloadError>,
    /// References left for the model to fetch itself
    pub skipped: Vec<RemoteUrl>,
}

impl AssetResolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Materializes remote assets found in message content
#[derive(Clone)]
pub struct AssetResolver {
    fetcher: Arc<dyn AssetFetcher>,
    options: ResolverOptions,
}

impl AssetResolver {
    pub fn new(fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self::with_options(fetcher, ResolverOptions::default())
    }

    pub fn with_options(fetcher: Arc<dyn AssetFetcher>, options: ResolverOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Download every remote reference in `messages` the model cannot read natively
    pub async fn resolve(&self, messages: &[Message], supported: &SupportedUrls) -> AssetResolution {
        self.resolve_references(collect_remote_references(messages), supported)
            .await
    }

    /// Download a set of references; duplicates are fetched once
    ///
    /// Support is decided per reference, so a URL used both as a supported
    /// image and as an unsupported file is still downloaded.
    pub async fn resolve_references(
        &self,
        references: Vec<RemoteReference>,
        supported: &SupportedUrls,
    ) -> AssetResolution {
        let mut skipped = Vec::new();
        let mut pending = Vec::new();
        let mut skipped_seen = HashSet::new();
        let mut pending_seen = HashSet::new();

        for reference in references {
            if supported.is_supported(reference.url.url(), &reference.media_type) {
                if skipped_seen.insert(reference.url.clone()) {
                    skipped.push(reference.url);
                }
            } else if pending_seen.insert(reference.url.clone()) {
                pending.push(reference.url);
            }
        }
        skipped.retain(|url| !pending_seen.contains(url));

        tracing::debug!(
            pending = pending.len(),
            skipped = skipped.len(),
            concurrency = self.options.concurrency,
            "Resolving remote assets"
        );

        let results: Vec<(RemoteUrl, Result<DownloadedAsset, DownloadError>)> = stream::iter(pending)
            .map(|url| async move {
                let result = self.fetch_with_retry(&url).await;
                (url, result)
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut resolution = AssetResolution {
            skipped,
            ..Default::default()
        };
        for (url, result) in results {
            match result {
                Ok(asset) => {
                    resolution.assets.insert(url.as_str().to_string(), asset);
                }
                Err(failure) => resolution.failures.push(failure),
            }
        }
        resolution
    }

    async fn fetch_with_retry(&self, url: &RemoteUrl) -> Result<DownloadedAsset, DownloadError> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut reason = String::new();

        for attempt in 1..=max_attempts {
            match tokio::time::timeout(self.options.timeout, self.fetcher.fetch(url.url())).await {
                Ok(Ok(asset)) => return Ok(asset),
                Ok(Err(err)) => reason = format!("{:#}", err),
                Err(_) => reason = format!("timed out after {:?}", self.options.timeout),
            }

            if attempt < max_attempts {
                tracing::warn!(url = %url, attempt, max_attempts, reason = %reason, "Asset fetch failed, retrying");
                apply_retry_delay(self.options.retry_base_delay, attempt).await;
            }
        }

        tracing::warn!(url = %url, attempts = max_attempts, reason = %reason, "Giving up on asset");
        Err(DownloadError {
            url: url.as_str().to_string(),
            attempts: max_attempts,
            reason,
        })
    }
}

/// Exponential back-off: `base * 2^(attempt-1)`, exponent capped at 10
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    base.saturating_mul(1_u32 << exponent)
}

async fn apply_retry_delay(base: Duration, attempt: u32) {
    let delay = retry_delay(base, attempt);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles_per_attempt() {
        let base = Duration::from_millis(10);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(10));
        assert_eq!(retry_delay(base, 2), Duration::from_millis(20));
        assert_eq!(retry_delay(base, 3), Duration::from_millis(40));
        assert_eq!(retry_delay(Duration::ZERO, 5), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_exponent_is_capped() {
        let base = Duration::from_millis(1);
        assert_eq!(retry_delay(base, 50), Duration::from_millis(1024));
    }
}
