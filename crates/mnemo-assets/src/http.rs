use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use mnemo_message::DownloadedAsset;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::fetcher::AssetFetcher;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`AssetFetcher`] backed by a shared `reqwest` client
///
/// The media type comes from the `Content-Type` header with parameters
/// stripped. Any non-2xx status is an error.
#[derive(Clone)]
pub struct HttpAssetFetcher {
    client: Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mnemo/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &Url) -> Result<DownloadedAsset> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request for {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Unexpected status {} for {}", status, url);
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty());

        let data = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?
            .to_vec();

        tracing::debug!(url = %url, bytes = data.len(), media_type = ?media_type, "Fetched asset");
        Ok(DownloadedAsset { data, media_type })
    }
}
