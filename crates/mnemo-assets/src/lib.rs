pub mod error;
pub mod fetcher;
pub mod http;
pub mod resolver;
pub mod supported;

pub use error::{AssetError, DownloadError};
pub use fetcher::AssetFetcher;
pub use http::HttpAssetFetcher;
pub use resolver::{AssetResolution, AssetResolver, ResolverOptions};
pub use supported::SupportedUrls;
