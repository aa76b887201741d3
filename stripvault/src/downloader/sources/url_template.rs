//! Sources that serve strips at predictable URLs.
//!
//! # URL Pattern
//!
//! Templates may contain these placeholders:
//!
//! - `{identifier}` - the comic's source identifier
//! - `{yyyy}` - four digit year
//! - `{MM}` - two digit month
//! - `{dd}` - two digit day
//!
//! For example `https://strips.example.com/{identifier}/{yyyy}/{MM}/{dd}.png`.

use chrono::{Datelike, NaiveDate};

use crate::downloader::{DownloadRequest, FetchError, HttpClient, SourceFetcher};

/// Fetcher that fills a URL template and GETs the result.
///
/// Wrap it in a [`BaseStrategy`](crate::downloader::BaseStrategy) to register
/// it with the registry.
pub struct UrlTemplateSource<C: HttpClient> {
    source: String,
    strip_template: String,
    avatar_template: Option<String>,
    http_client: C,
}

impl<C: HttpClient> UrlTemplateSource<C> {
    pub fn new(source: impl Into<String>, strip_template: impl Into<String>, http_client: C) -> Self {
        Self {
            source: source.into(),
            strip_template: strip_template.into(),
            avatar_template: None,
            http_client,
        }
    }

    /// Set the avatar template. Only `{identifier}` is substituted.
    pub fn with_avatar_template(mut self, template: impl Into<String>) -> Self {
        self.avatar_template = Some(template.into());
        self
    }

    /// Build the strip URL for an identifier and date.
    pub fn strip_url(&self, identifier: &str, date: NaiveDate) -> String {
        self.strip_template
            .replace("{identifier}", identifier)
            .replace("{yyyy}", &format!("{:04}", date.year()))
            .replace("{MM}", &format!("{:02}", date.month()))
            .replace("{dd}", &format!("{:02}", date.day()))
    }
}

impl<C: HttpClient> SourceFetcher for UrlTemplateSource<C> {
    fn source(&self) -> &str {
        &self.source
    }

    fn fetch_strip(&self, request: &DownloadRequest) -> Result<Vec<u8>, FetchError> {
        if request.source_identifier.is_empty() {
            return Err(FetchError::Parse(format!(
                "comic {} has no source identifier",
                request.comic_name
            )));
        }
        let url = self.strip_url(&request.source_identifier, request.date);
        self.http_client.get(&url)
    }

    fn fetch_avatar(
        &self,
        _comic_id: u32,
        _comic_name: &str,
        source_identifier: &str,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        match &self.avatar_template {
            Some(template) => {
                let url = template.replace("{identifier}", source_identifier);
                self.http_client.get(&url).map(Some)
            }
            None => Ok(None),
        }
    }
}
