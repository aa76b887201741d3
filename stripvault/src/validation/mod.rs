//! Image validation.
//!
//! Every strip is validated before it reaches the archive: the bytes must
//! decode as a supported image format, stay under a size ceiling and, for
//! strips, meet minimum dimensions.
//!
//! The [`ImageValidator`] trait is the seam the save pipeline and the
//! downloader strategies depend on; [`StandardValidator`] implements it with
//! the `image` crate.

mod format;
mod validator;

pub use format::StripFormat;
pub use validator::{ImageValidator, StandardValidator, ValidationResult, MAX_IMAGE_SIZE};
