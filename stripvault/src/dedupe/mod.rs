//! Duplicate detection.
//!
//! Syndicates regularly re-publish old strips under new dates. Every archived
//! strip is fingerprinted and the fingerprint recorded in a per-year
//! partition (`<comic>/<yyyy>/image-hashes.json`); a save whose hash is
//! already present in that year's partition is skipped.

mod detector;
mod hasher;
mod record;
mod store;

pub use detector::DuplicateDetector;
pub use hasher::{
    hasher_for, AverageHasher, DifferenceHasher, HashAlgorithm, ImageHasher, Sha256Hasher,
};
pub use record::ImageHashRecord;
pub use store::{DuplicateHashStore, HashPartition};
