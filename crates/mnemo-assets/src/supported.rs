use regex::Regex;
use url::Url;

use crate::error::AssetError;

/// URLs a destination model can read on its own, grouped by media type
///
/// Patterns are `*`, a wildcard like `image/*`, or an exact media type.
/// A reference matching any regex under a matching pattern is not
/// downloaded.
#[derive(Debug, Clone, Default)]
pub struct SupportedUrls {
    entries: Vec<(String, Vec<Regex>)>,
}

impl SupportedUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, media_pattern: impl Into<String>, url_pattern: &str) -> Result<Self, AssetError> {
        let regex = Regex::new(url_pattern).map_err(|source| AssetError::InvalidPattern {
            pattern: url_pattern.to_string(),
            source,
        })?;

        let media_pattern = media_pattern.into().to_ascii_lowercase();
        match self.entries.iter_mut().find(|(pattern, _)| *pattern == media_pattern) {
            Some((_, regexes)) => regexes.push(regex),
            None => self.entries.push((media_pattern, vec![regex])),
        }
        Ok(self)
    }

    /// Build from `(media pattern, url regexes)` pairs, e.g. loaded from config
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, AssetError>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut supported = Self::new();
        for (media_pattern, url_patterns) in patterns {
            let media_pattern = media_pattern.into();
            for url_pattern in &url_patterns {
                supported = supported.with(media_pattern.clone(), url_pattern)?;
            }
        }
        Ok(supported)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_supported(&self, url: &Url, media_type: &str) -> bool {
        let media_type = media_type.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|(pattern, _)| media_matches(pattern, &media_type))
            .any(|(_, regexes)| regexes.iter().any(|regex| regex.is_match(url.as_str())))
    }
}

fn media_matches(pattern: &str, media_type: &str) -> bool {
    if pattern == "*" || pattern == media_type {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(family) => media_type
            .split_once('/')
            .map_or(false, |(candidate, _)| candidate == family),
        None => false,
    }
}
