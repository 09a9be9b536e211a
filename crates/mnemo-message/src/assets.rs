use std::collections::HashMap;

use crate::types::{DataContent, Message, RemoteUrl, UiPart};

/// Bytes fetched for a remote reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub data: Vec<u8>,
    pub media_type: Option<String>,
}

/// Downloaded-asset cache keyed by the original reference string
pub type DownloadedAssets = HashMap<String, DownloadedAsset>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Image,
    File,
}

/// Remote reference found inside message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReference {
    pub url: RemoteUrl,
    /// Declared media type; images without one use `image/*`
    pub media_type: String,
    pub kind: PartKind,
}

/// Collect every image/file part whose payload is a remote URL
///
/// Order follows message and part order; duplicates are kept so callers can
/// see every place a URL is used.
pub fn collect_remote_references(messages: &[Message]) -> Vec<RemoteReference> {
    let mut references = Vec::new();

    for message in messages {
        for part in &message.content.parts {
            let (url, media_type, kind) = match part {
                UiPart::Text { .. } => continue,
                UiPart::Image { url, media_type } => (
                    url,
                    media_type.clone().unwrap_or_else(|| "image/*".to_string()),
                    PartKind::Image,
                ),
                UiPart::File { url, media_type, .. } => (url, media_type.clone(), PartKind::File),
            };

            if let DataContent::Url(url) = DataContent::parse(url) {
                references.push(RemoteReference { url, media_type, kind });
            }
        }
    }

    references
}
