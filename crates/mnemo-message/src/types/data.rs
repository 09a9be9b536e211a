use std::fmt;
use std::hash::{Hash, Hasher};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::{ConvertError, Result};

/// Remote reference that keeps the exact string it was given
///
/// The parsed [`Url`] normalizes host case, default ports and dot segments,
/// so it is only used for fetching and pattern matching. Equality, hashing,
/// serialization and cache lookups go through the original string.
#[derive(Debug, Clone)]
pub struct RemoteUrl {
    raw: String,
    parsed: Url,
}

impl RemoteUrl {
    pub fn parse(raw: &str) -> std::result::Result<Self, url::ParseError> {
        let parsed = Url::parse(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    /// The reference exactly as supplied
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.parsed
    }
}

impl PartialEq for RemoteUrl {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for RemoteUrl {}

impl Hash for RemoteUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<Url> for RemoteUrl {
    fn from(parsed: Url) -> Self {
        Self {
            raw: parsed.as_str().to_string(),
            parsed,
        }
    }
}

/// Payload of an image or file part
///
/// The four forms are interchangeable descriptions of the same asset.
/// `PartialEq` compares the representation; use [`DataContent::same_payload`]
/// to compare what the payload actually contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataContent {
    /// Remote reference (http, https, s3, ...)
    Url(RemoteUrl),

    /// Self-describing reference: `data:<media type>;base64,<payload>`
    DataUri(String),

    /// Raw byte buffer
    Bytes(Vec<u8>),

    /// Plain base64 text without a header
    Base64(String),
}

impl DataContent {
    /// Classify a string payload
    ///
    /// `data:` prefixes are data URIs, absolute URLs are remote references and
    /// everything else is treated as already-encoded base64. Base64 text never
    /// contains `:`, so it can't be mistaken for a URL.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("data:") {
            return Self::DataUri(value.to_string());
        }
        match RemoteUrl::parse(value) {
            Ok(url) => Self::Url(url),
            Err(_) => Self::Base64(value.to_string()),
        }
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn url(url: Url) -> Self {
        Self::Url(url.into())
    }

    /// Remote reference, if this payload is one
    pub fn as_url(&self) -> Option<&RemoteUrl> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// Media type carried inline by a data URI
    pub fn embedded_media_type(&self) -> Result<Option<String>> {
        match self {
            Self::DataUri(uri) => split_data_uri(uri).map(|(media_type, _)| Some(media_type)),
            _ => Ok(None),
        }
    }

    /// Decode the payload to bytes. Remote references return `None`.
    pub fn to_bytes(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Url(_) => Ok(None),
            Self::Bytes(bytes) => Ok(Some(bytes.clone())),
            Self::Base64(text) => decode_base64(text).map(Some),
            Self::DataUri(uri) => {
                let (_, payload) = split_data_uri(uri)?;
                decode_base64(&payload).map(Some)
            }
        }
    }

    /// True when both payloads describe the same asset
    ///
    /// URLs compare by value, every inline form compares by decoded bytes.
    pub fn same_payload(&self, other: &DataContent) -> bool {
        match (self, other) {
            (Self::Url(a), Self::Url(b)) => a == b,
            (Self::Url(_), _) | (_, Self::Url(_)) => false,
            _ => match (self.to_bytes(), other.to_bytes()) {
                (Ok(Some(a)), Ok(Some(b))) => a == b,
                _ => false,
            },
        }
    }

    /// Render as a string usable by a UI: the URL itself, or a data URI
    pub fn to_renderable(&self, media_type: &str) -> Result<String> {
        match self {
            Self::Url(url) => Ok(url.as_str().to_string()),
            Self::DataUri(uri) => {
                split_data_uri(uri)?;
                Ok(uri.clone())
            }
            Self::Bytes(bytes) => Ok(to_data_uri(media_type, bytes)),
            Self::Base64(text) => {
                decode_base64(text)?;
                Ok(format!("data:{};base64,{}", media_type, text))
            }
        }
    }
}

impl From<Vec<u8>> for DataContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Url> for DataContent {
    fn from(url: Url) -> Self {
        Self::Url(url.into())
    }
}

impl From<RemoteUrl> for DataContent {
    fn from(url: RemoteUrl) -> Self {
        Self::Url(url)
    }
}

impl From<&str> for DataContent {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for DataContent {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Split `data:<media type>;base64,<payload>` into `(media type, payload)`
pub fn split_data_uri(uri: &str) -> Result<(String, String)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ConvertError::invalid_payload("missing 'data:' scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ConvertError::invalid_payload("missing ',' between header and payload"))?;

    let mut segments = header.split(';');
    let media_type = segments.next().unwrap_or_default().trim();
    if media_type.is_empty() || !media_type.contains('/') {
        return Err(ConvertError::invalid_payload(format!(
            "missing media type in header '{}'",
            header
        )));
    }
    if !segments.any(|segment| segment.trim().eq_ignore_ascii_case("base64")) {
        return Err(ConvertError::invalid_payload(format!(
            "unsupported encoding in header '{}', expected base64",
            header
        )));
    }

    Ok((media_type.to_string(), payload.to_string()))
}

pub(crate) fn to_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| ConvertError::invalid_payload(format!("payload is not valid base64: {}", e)))
}

impl Serialize for DataContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Url(url) => serializer.serialize_str(url.as_str()),
            Self::DataUri(uri) => serializer.serialize_str(uri),
            Self::Bytes(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            Self::Base64(text) => serializer.serialize_str(text),
        }
    }
}

struct DataContentVisitor;

impl<'de> Visitor<'de> for DataContentVisitor {
    type Value = DataContent;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a URL, data URI, base64 string or byte array")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<DataContent, E> {
        Ok(DataContent::parse(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<DataContent, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(DataContent::Bytes(bytes))
    }
}

impl<'de> Deserialize<'de> for DataContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(DataContentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifies_forms() {
        assert!(matches!(DataContent::parse("https://example.com/cat.png"), DataContent::Url(_)));
        assert!(matches!(DataContent::parse("data:image/png;base64,AAAA"), DataContent::DataUri(_)));
        assert!(matches!(DataContent::parse("aGVsbG8="), DataContent::Base64(_)));
    }

    #[test]
    fn test_remote_url_keeps_original_string() {
        let raw = "https://Example.COM:443/a/../cat.png";
        let data = DataContent::parse(raw);

        let url = data.as_url().unwrap();
        assert_eq!(url.as_str(), raw);
        assert_eq!(url.url().as_str(), "https://example.com/cat.png");
        assert_eq!(data.to_renderable("image/png").unwrap(), raw);
        assert_eq!(serde_json::to_value(&data).unwrap(), serde_json::json!(raw));
        assert!(!data.same_payload(&DataContent::parse("https://example.com/cat.png")));
    }

    #[test]
    fn test_split_data_uri() {
        let (media_type, payload) = split_data_uri("data:text/plain;base64,aGVsbG8=").unwrap();
        assert_eq!(media_type, "text/plain");
        assert_eq!(payload, "aGVsbG8=");
    }

    #[test]
    fn test_split_data_uri_rejects_malformed_headers() {
        assert!(matches!(
            split_data_uri("data:text/plain;base64"),
            Err(ConvertError::InvalidEncodedPayload(_))
        ));
        assert!(matches!(
            split_data_uri("data:;base64,aGVsbG8="),
            Err(ConvertError::InvalidEncodedPayload(_))
        ));
        assert!(matches!(
            split_data_uri("data:text/plain,hello"),
            Err(ConvertError::InvalidEncodedPayload(_))
        ));
    }

    #[test]
    fn test_same_payload_across_forms() {
        let bytes = DataContent::bytes(b"hello".to_vec());
        let base64 = DataContent::parse("aGVsbG8=");
        let uri = DataContent::parse("data:text/plain;base64,aGVsbG8=");

        assert!(bytes.same_payload(&base64));
        assert!(base64.same_payload(&uri));
        assert!(!bytes.same_payload(&DataContent::parse("https://example.com/hello.txt")));
    }

    #[test]
    fn test_bytes_serialize_as_base64() {
        let json = serde_json::to_value(DataContent::bytes(b"hello".to_vec())).unwrap();
        assert_eq!(json, serde_json::json!("aGVsbG8="));

        let back: DataContent = serde_json::from_value(serde_json::json!([104, 105])).unwrap();
        assert_eq!(back, DataContent::Bytes(b"hi".to_vec()));
    }
}
