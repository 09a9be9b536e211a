pub mod types;
pub mod media;
pub mod assets;
pub mod converter;
pub mod error;

pub use types::{
    Content, ContentPart, DataContent, FlatMessage, Message, MessageFormat, MessageRole,
    RemoteUrl, StructuredContent, UiPart, WireMessage, STRUCTURED_FORMAT_VERSION,
};
pub use types::data::split_data_uri;
pub use media::detect_image_media_type;
pub use assets::{collect_remote_references, DownloadedAsset, DownloadedAssets, PartKind, RemoteReference};
pub use converter::MessageConverter;
pub use error::{ConvertError, Result};
