use async_trait::async_trait;
use mnemo_message::DownloadedAsset;
use url::Url;

/// Fetches the bytes behind one remote reference
///
/// Implementations make a single attempt; retries and timeouts belong to
/// [`AssetResolver`](crate::AssetResolver).
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> anyhow::Result<DownloadedAsset>;
}
