//! Concrete source fetchers.

mod url_template;

pub use url_template::UrlTemplateSource;
