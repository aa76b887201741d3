//! The per-source strategy contract.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{DownloadRequest, DownloadResult, FailureKind, FetchError};
use crate::validation::{ImageValidator, StandardValidator};

/// Fetches strips for one source.
///
/// Implementations are flat and independent: one per source, registered in
/// the [`DownloaderRegistry`](super::DownloaderRegistry) under the name
/// returned by [`source`](Self::source).
pub trait DownloaderStrategy: Send + Sync {
    /// Name of the source this strategy serves.
    fn source(&self) -> &str;

    /// Download the strip described by `request`.
    ///
    /// Ordinary failures are reported inside the returned [`DownloadResult`];
    /// an `Err` is classified by the registry.
    fn download_comic(&self, request: &DownloadRequest) -> Result<DownloadResult, FetchError>;

    /// Download a comic's avatar. `None` when unavailable.
    fn download_avatar(&self, comic_id: u32, comic_name: &str, source_identifier: &str) -> Option<Vec<u8>>;
}

/// The page-fetch and parse logic for one source.
pub trait SourceFetcher: Send + Sync {
    fn source(&self) -> &str;

    /// Fetch the raw image bytes for a request.
    fn fetch_strip(&self, request: &DownloadRequest) -> Result<Vec<u8>, FetchError>;

    /// Fetch avatar bytes, if the source has avatars.
    fn fetch_avatar(
        &self,
        _comic_id: u32,
        _comic_name: &str,
        _source_identifier: &str,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        Ok(None)
    }
}

/// Wraps a [`SourceFetcher`] with the common result handling.
///
/// - empty image data is a failure whose message mentions "empty";
/// - bytes that do not validate as an image are a parsing failure;
/// - fetch errors become classified failure results;
/// - avatar errors are swallowed into `None`.
pub struct BaseStrategy<F: SourceFetcher> {
    fetcher: F,
    validator: Arc<dyn ImageValidator>,
}

impl<F: SourceFetcher> BaseStrategy<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_validator(fetcher, Arc::new(StandardValidator::new()))
    }

    pub fn with_validator(fetcher: F, validator: Arc<dyn ImageValidator>) -> Self {
        Self { fetcher, validator }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<F: SourceFetcher> DownloaderStrategy for BaseStrategy<F> {
    fn source(&self) -> &str {
        self.fetcher.source()
    }

    fn download_comic(&self, request: &DownloadRequest) -> Result<DownloadResult, FetchError> {
        let bytes = match self.fetcher.fetch_strip(request) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(
                    comic = %request.comic_name,
                    date = %request.date,
                    error = %e,
                    "Strip fetch failed"
                );
                return Ok(DownloadResult::failure(
                    request.clone(),
                    e.classify(),
                    format!("Failed to download {} for {}: {}", request.comic_name, request.date, e),
                ));
            }
        };

        if bytes.is_empty() {
            return Ok(DownloadResult::failure(
                request.clone(),
                FailureKind::ParsingError,
                "Downloaded image data is empty",
            ));
        }

        let validation = self.validator.validate(&bytes);
        if !validation.valid {
            warn!(
                comic = %request.comic_name,
                date = %request.date,
                error = validation.error_message(),
                "Downloaded data is not a valid image"
            );
            return Ok(DownloadResult::failure(
                request.clone(),
                FailureKind::ParsingError,
                format!("Invalid image downloaded: {}", validation.error_message()),
            ));
        }

        Ok(DownloadResult::success(request.clone(), bytes))
    }

    fn download_avatar(&self, comic_id: u32, comic_name: &str, source_identifier: &str) -> Option<Vec<u8>> {
        match self.fetcher.fetch_avatar(comic_id, comic_name, source_identifier) {
            Ok(Some(bytes)) if !bytes.is_empty() && self.validator.validate(&bytes).valid => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                debug!(comic = comic_name, error = %e, "Avatar fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png_bytes;
    use chrono::NaiveDate;

    enum Reply {
        Bytes(Vec<u8>),
        Fail(fn() -> FetchError),
    }

    struct FixedFetcher {
        strip: Reply,
        avatar: Reply,
    }

    impl SourceFetcher for FixedFetcher {
        fn source(&self) -> &str {
            "fixed"
        }

        fn fetch_strip(&self, _: &DownloadRequest) -> Result<Vec<u8>, FetchError> {
            match &self.strip {
                Reply::Bytes(b) => Ok(b.clone()),
                Reply::Fail(f) => Err(f()),
            }
        }

        fn fetch_avatar(&self, _: u32, _: &str, _: &str) -> Result<Option<Vec<u8>>, FetchError> {
            match &self.avatar {
                Reply::Bytes(b) => Ok(Some(b.clone())),
                Reply::Fail(f) => Err(f()),
            }
        }
    }

    fn request() -> DownloadRequest {
        DownloadRequest {
            comic_id: 1,
            comic_name: "Fixed".to_string(),
            source: "fixed".to_string(),
            source_identifier: "fixed-id".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn strategy(strip: Reply, avatar: Reply) -> BaseStrategy<FixedFetcher> {
        BaseStrategy::new(FixedFetcher { strip, avatar })
    }

    #[test]
    fn test_success() {
        let data = png_bytes(100, 50, 1);
        let s = strategy(Reply::Bytes(data.clone()), Reply::Bytes(Vec::new()));

        let result = s.download_comic(&request()).unwrap();
        assert!(result.is_success());
        assert_eq!(result.image_bytes(), Some(data.as_slice()));
        assert_eq!(s.source(), "fixed");
    }

    #[test]
    fn test_empty_data_is_failure() {
        let s = strategy(Reply::Bytes(Vec::new()), Reply::Bytes(Vec::new()));
        let result = s.download_comic(&request()).unwrap();

        assert!(!result.is_success());
        assert!(result.error_message().unwrap().contains("empty"));
    }

    #[test]
    fn test_invalid_image_is_failure() {
        let s = strategy(Reply::Bytes(b"<html>".to_vec()), Reply::Bytes(Vec::new()));
        let result = s.download_comic(&request()).unwrap();

        assert_eq!(result.failure_kind(), Some(FailureKind::ParsingError));
        assert!(result.error_message().unwrap().starts_with("Invalid image downloaded"));
    }

    #[test]
    fn test_fetch_error_is_classified() {
        let s = strategy(
            Reply::Fail(|| FetchError::Timeout("slow".into())),
            Reply::Bytes(Vec::new()),
        );
        let result = s.download_comic(&request()).unwrap();
        assert_eq!(result.failure_kind(), Some(FailureKind::NetworkError));
    }

    #[test]
    fn test_avatar_faults_swallowed() {
        let s = strategy(
            Reply::Bytes(Vec::new()),
            Reply::Fail(|| FetchError::Network("down".into())),
        );
        assert!(s.download_avatar(1, "Fixed", "fixed-id").is_none());

        let s = strategy(Reply::Bytes(Vec::new()), Reply::Bytes(b"junk".to_vec()));
        assert!(s.download_avatar(1, "Fixed", "fixed-id").is_none());

        let avatar = png_bytes(32, 32, 2);
        let s = strategy(Reply::Bytes(Vec::new()), Reply::Bytes(avatar.clone()));
        assert_eq!(s.download_avatar(1, "Fixed", "fixed-id"), Some(avatar));
    }
}
