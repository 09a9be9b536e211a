use crate::assets::DownloadedAssets;
use crate::error::{ConvertError, Result};
use crate::media::detect_image_media_type;
use crate::types::data::{decode_base64, split_data_uri};
use crate::types::{
    Content, ContentPart, DataContent, FlatMessage, Message, MessageFormat, RemoteUrl,
    StructuredContent, UiPart, WireMessage,
};

/// Converts messages between the flat and structured wire formats
///
/// When built with a downloaded-asset cache, remote references found in the
/// cache are replaced by the cached bytes and media type.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageConverter<'a> {
    assets: Option<&'a DownloadedAssets>,
}

enum Payload {
    Remote(RemoteUrl),
    Inline(Vec<u8>),
}

struct ResolvedPayload {
    payload: Payload,
    /// Media type carried by the payload itself (data URI header or cache)
    media_type: Option<String>,
}

impl<'a> MessageConverter<'a> {
    pub fn new() -> Self {
        Self { assets: None }
    }

    pub fn with_assets(assets: &'a DownloadedAssets) -> Self {
        Self { assets: Some(assets) }
    }

    /// Normalize one content part to its canonical form
    ///
    /// Canonical parts carry either a remote URL or raw bytes. Images get a
    /// sniffed media type when the bytes have a known signature; files must
    /// end up with a media type or the part is rejected.
    pub fn normalize_part(&self, part: &ContentPart) -> Result<ContentPart> {
        match part {
            ContentPart::Text { .. } => Ok(part.clone()),

            ContentPart::Image { data, media_type } => {
                let resolved = self.resolve_payload(data)?;
                let declared = media_type.clone().or(resolved.media_type);

                match resolved.payload {
                    Payload::Remote(url) => Ok(ContentPart::Image {
                        data: DataContent::Url(url),
                        media_type: declared,
                    }),
                    Payload::Inline(bytes) => {
                        let media_type = resolve_image_media_type(&bytes, declared);
                        Ok(ContentPart::Image {
                            data: DataContent::Bytes(bytes),
                            media_type: Some(media_type),
                        })
                    }
                }
            }

            ContentPart::File { data, media_type, filename } => {
                let resolved = self.resolve_payload(data)?;
                // Declared type is authoritative for files
                let media_type = media_type
                    .clone()
                    .or(resolved.media_type)
                    .ok_or_else(|| ConvertError::MissingMediaType(describe_file(data, filename.as_deref())))?;

                let data = match resolved.payload {
                    Payload::Remote(url) => DataContent::Url(url),
                    Payload::Inline(bytes) => DataContent::Bytes(bytes),
                };

                Ok(ContentPart::File {
                    data,
                    media_type: Some(media_type),
                    filename: filename.clone(),
                })
            }
        }
    }

    /// Flat → structured
    pub fn to_structured(&self, message: &FlatMessage) -> Result<Message> {
        let content = match &message.content {
            Content::Text(text) => StructuredContent::from_text(text.clone()),
            Content::Parts(parts) => StructuredContent::new(
                parts
                    .iter()
                    .map(|part| self.part_to_ui(part))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(Message {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            resource_id: message.resource_id.clone(),
            role: message.role,
            content,
            created_at: message.created_at,
        })
    }

    /// Structured → flat
    pub fn to_flat(&self, message: &Message) -> Result<FlatMessage> {
        let content = match (&message.content.content, message.content.parts.as_slice()) {
            (Some(text), [UiPart::Text { text: part }]) if part == text => Content::Text(text.clone()),
            (Some(text), []) => Content::Text(text.clone()),
            (_, parts) => Content::Parts(
                parts
                    .iter()
                    .map(|part| self.ui_to_part(part))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(FlatMessage {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            resource_id: message.resource_id.clone(),
            role: message.role,
            content,
            created_at: message.created_at,
        })
    }

    /// Normalize a message of unknown wire format into the canonical form
    pub fn to_canonical(&self, message: &WireMessage) -> Result<Message> {
        match message {
            WireMessage::Flat(flat) => self.to_structured(flat),
            WireMessage::Structured(structured) => {
                let parts = structured
                    .content
                    .parts
                    .iter()
                    .map(|part| self.part_to_ui(&self.ui_to_part(part)?))
                    .collect::<Result<Vec<_>>>()?;

                let mut canonical = structured.clone();
                canonical.content.parts = parts;
                Ok(canonical)
            }
        }
    }

    /// Render a canonical message in the requested wire format
    pub fn to_wire(&self, message: &Message, format: MessageFormat) -> Result<WireMessage> {
        match format {
            MessageFormat::Flat => self.to_flat(message).map(WireMessage::Flat),
            MessageFormat::Structured => Ok(WireMessage::Structured(message.clone())),
        }
    }

    fn part_to_ui(&self, part: &ContentPart) -> Result<UiPart> {
        match self.normalize_part(part)? {
            ContentPart::Text { text } => Ok(UiPart::Text { text }),
            ContentPart::Image { data, media_type } => {
                let url = data.to_renderable(media_type.as_deref().unwrap_or("image/*"))?;
                Ok(UiPart::Image { url, media_type })
            }
            ContentPart::File { data, media_type, filename } => {
                let media_type = media_type
                    .ok_or_else(|| ConvertError::MissingMediaType(describe_file(&data, filename.as_deref())))?;
                Ok(UiPart::File {
                    url: data.to_renderable(&media_type)?,
                    media_type,
                    filename,
                })
            }
        }
    }

    fn ui_to_part(&self, part: &UiPart) -> Result<ContentPart> {
        match part {
            UiPart::Text { text } => Ok(ContentPart::Text { text: text.clone() }),
            UiPart::Image { url, media_type } => self.normalize_part(&ContentPart::Image {
                data: DataContent::parse(url),
                media_type: media_type.clone(),
            }),
            UiPart::File { url, media_type, filename } => self.normalize_part(&ContentPart::File {
                data: DataContent::parse(url),
                media_type: Some(media_type.clone()),
                filename: filename.clone(),
            }),
        }
    }

    fn resolve_payload(&self, data: &DataContent) -> Result<ResolvedPayload> {
        match data {
            DataContent::Url(url) => {
                if let Some(asset) = self.assets.and_then(|assets| assets.get(url.as_str())) {
                    return Ok(ResolvedPayload {
                        payload: Payload::Inline(asset.data.clone()),
                        media_type: asset.media_type.clone(),
                    });
                }
                Ok(ResolvedPayload {
                    payload: Payload::Remote(url.clone()),
                    media_type: None,
                })
            }
            DataContent::DataUri(uri) => {
                let (media_type, payload) = split_data_uri(uri)?;
                Ok(ResolvedPayload {
                    payload: Payload::Inline(decode_base64(&payload)?),
                    media_type: Some(media_type),
                })
            }
            DataContent::Bytes(bytes) => Ok(ResolvedPayload {
                payload: Payload::Inline(bytes.clone()),
                media_type: None,
            }),
            DataContent::Base64(text) => Ok(ResolvedPayload {
                payload: Payload::Inline(decode_base64(text)?),
                media_type: None,
            }),
        }
    }
}

/// Detected type wins over the declared one; `image/*` when neither exists
fn resolve_image_media_type(bytes: &[u8], declared: Option<String>) -> String {
    match detect_image_media_type(bytes) {
        Some(detected) => {
            if let Some(declared) = declared.as_deref() {
                if !declared.eq_ignore_ascii_case(detected) {
                    tracing::debug!(declared, detected, "Detected image media type overrides declared type");
                }
            }
            detected.to_string()
        }
        None => declared.unwrap_or_else(|| "image/*".to_string()),
    }
}

fn describe_file(data: &DataContent, filename: Option<&str>) -> String {
    let source = match data {
        DataContent::Url(url) => format!("url {}", url),
        DataContent::DataUri(_) => "data uri".to_string(),
        DataContent::Bytes(bytes) => format!("{} inline bytes", bytes.len()),
        DataContent::Base64(_) => "base64 payload".to_string(),
    };
    match filename {
        Some(name) => format!("{}, filename {}", source, name),
        None => source,
    }
}
