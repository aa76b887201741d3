//! Sidecar metadata for archived strips.
//!
//! After a strip is written, the save pipeline asks an [`ImageAnalyzer`] to
//! derive metadata (dimensions, format, color mode) and stores it beside the
//! image via [`MetadataRepository`]. Failures here are soft: they are logged
//! and never fail the save.

mod analyzer;
mod metadata;
mod repository;

pub use analyzer::{AnalysisError, ColorAnalyzer, ImageAnalyzer, DEFAULT_SAMPLE_PERCENTAGE};
pub use metadata::{ColorMode, ImageMetadata};
pub use repository::{sidecar_path, MetadataRepository};
