use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::data::DataContent;

/// Version tag carried by structured content
pub const STRUCTURED_FORMAT_VERSION: u8 = 2;

/// Flat message content: a plain string or a list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Simple text content
    Text(String),

    /// Multipart content (text, images, files)
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },

    Image {
        data: DataContent,
        #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },

    File {
        data: DataContent,
        /// Required once normalized; may be omitted on the wire when `data`
        /// is a data URI that carries its own media type
        #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(data: impl Into<DataContent>) -> Self {
        Self::Image {
            data: data.into(),
            media_type: None,
        }
    }

    pub fn image_with_type(data: impl Into<DataContent>, media_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            media_type: Some(media_type.into()),
        }
    }

    pub fn file(data: impl Into<DataContent>, media_type: impl Into<String>) -> Self {
        Self::File {
            data: data.into(),
            media_type: Some(media_type.into()),
            filename: None,
        }
    }

    pub fn with_filename(self, name: impl Into<String>) -> Self {
        match self {
            Self::File { data, media_type, .. } => Self::File {
                data,
                media_type,
                filename: Some(name.into()),
            },
            other => other,
        }
    }

    pub fn data(&self) -> Option<&DataContent> {
        match self {
            Self::Text { .. } => None,
            Self::Image { data, .. } | Self::File { data, .. } => Some(data),
        }
    }

    pub fn media_type(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Image { media_type, .. } | Self::File { media_type, .. } => media_type.as_deref(),
        }
    }

    /// Functional equivalence: equal text, same payload for images, same
    /// payload and filename for files (plus media type when both declare one)
    ///
    /// Image media types are not compared because normalization may infer them.
    pub fn is_equivalent(&self, other: &ContentPart) -> bool {
        match (self, other) {
            (Self::Text { text: a }, Self::Text { text: b }) => a == b,
            (Self::Image { data: a, .. }, Self::Image { data: b, .. }) => a.same_payload(b),
            (
                Self::File { data: a, media_type: ma, filename: fa },
                Self::File { data: b, media_type: mb, filename: fb },
            ) => {
                let media_matches = match (ma, mb) {
                    (Some(ma), Some(mb)) => ma.eq_ignore_ascii_case(mb),
                    _ => true,
                };
                a.same_payload(b) && fa == fb && media_matches
            }
            _ => false,
        }
    }
}

impl Content {
    /// Create text content
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Get as plain text (if possible)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Parts(parts) => match parts.as_slice() {
                [ContentPart::Text { text }] => Some(text),
                _ => None,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Parts(parts) => parts.is_empty(),
        }
    }

    /// Equivalence under the payload classes of [`ContentPart::is_equivalent`]
    pub fn is_equivalent(&self, other: &Content) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Parts(a), Self::Parts(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_equivalent(y))
            }
            _ => false,
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

/// UI-renderable segment of structured content
///
/// Binary payloads are always rendered as a URL or data URI string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiPart {
    Text {
        text: String,
    },

    Image {
        url: String,
        #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },

    File {
        url: String,
        #[serde(rename = "mediaType")]
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

impl UiPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Structured content: `{format: 2, parts: [...], content?}`
///
/// `content` keeps the original string when the message arrived as plain
/// text, so converting back yields a string again instead of a part list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub format: FormatVersion,
    pub parts: Vec<UiPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StructuredContent {
    pub fn new(parts: Vec<UiPart>) -> Self {
        Self {
            format: FormatVersion,
            parts,
            content: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            format: FormatVersion,
            parts: vec![UiPart::text(text.clone())],
            content: Some(text),
        }
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                UiPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Marker for `format: 2`; any other value fails deserialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatVersion;

impl Serialize for FormatVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(STRUCTURED_FORMAT_VERSION)
    }
}

impl<'de> Deserialize<'de> for FormatVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = u8::deserialize(deserializer)?;
        if version == STRUCTURED_FORMAT_VERSION {
            Ok(FormatVersion)
        } else {
            Err(de::Error::custom(format!(
                "unsupported structured content format {}, expected {}",
                version, STRUCTURED_FORMAT_VERSION
            )))
        }
    }
}
