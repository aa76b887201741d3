//! Service construction errors.

use thiserror::Error;

use crate::comic::CatalogError;
use crate::downloader::{FetchError, RegistryError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("comic catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to register source '{source_name}': {source}")]
    Registration {
        source_name: String,
        #[source]
        source: RegistryError,
    },

    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] FetchError),

    #[error("failed to build download thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
