//! Content hashing for duplicate detection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Hash algorithm used to fingerprint strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashAlgorithm {
    /// SHA-256 of the raw bytes. Only byte-identical files collide.
    #[default]
    Sha256,
    /// 8x8 average hash. Tolerates re-encoding and resizing.
    AverageHash,
    /// 9x8 difference hash. Tolerates re-encoding and brightness shifts.
    DifferenceHash,
}

impl HashAlgorithm {
    /// Name used in configuration files.
    pub fn config_name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::AverageHash => "average",
            HashAlgorithm::DifferenceHash => "difference",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "average" | "average_hash" | "ahash" => Ok(HashAlgorithm::AverageHash),
            "difference" | "difference_hash" | "dhash" => Ok(HashAlgorithm::DifferenceHash),
            other => Err(format!(
                "unknown hash algorithm '{}' (expected sha256, average or difference)",
                other
            )),
        }
    }
}

/// Computes a hash string for image bytes.
pub trait ImageHasher: Send + Sync {
    /// Hash `data`. Returns `None` if the bytes cannot be hashed (perceptual
    /// hashers need decodable images).
    fn hash(&self, data: &[u8]) -> Option<String>;

    fn algorithm(&self) -> HashAlgorithm;
}

/// Build the hasher for an algorithm.
pub fn hasher_for(algorithm: HashAlgorithm) -> Arc<dyn ImageHasher> {
    match algorithm {
        HashAlgorithm::Sha256 => Arc::new(Sha256Hasher),
        HashAlgorithm::AverageHash => Arc::new(AverageHasher),
        HashAlgorithm::DifferenceHash => Arc::new(DifferenceHasher),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ImageHasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> Option<String> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Some(format!("{:x}", hasher.finalize()))
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AverageHasher;

impl ImageHasher for AverageHasher {
    fn hash(&self, data: &[u8]) -> Option<String> {
        let pixels = grayscale_thumbnail(data, 8, 8)?;
        let mean = pixels.iter().map(|p| u32::from(*p)).sum::<u32>() / pixels.len() as u32;

        let bits = pixels
            .iter()
            .fold(0u64, |acc, p| (acc << 1) | u64::from(u32::from(*p) > mean));
        Some(format!("{:016x}", bits))
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::AverageHash
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceHasher;

impl ImageHasher for DifferenceHasher {
    fn hash(&self, data: &[u8]) -> Option<String> {
        let pixels = grayscale_thumbnail(data, 9, 8)?;

        let mut bits = 0u64;
        for row in pixels.chunks_exact(9) {
            for pair in row.windows(2) {
                bits = (bits << 1) | u64::from(pair[0] > pair[1]);
            }
        }
        Some(format!("{:016x}", bits))
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::DifferenceHash
    }
}

/// Decode, convert to 8-bit luma and downscale to `width` x `height`.
fn grayscale_thumbnail(data: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    match image::load_from_memory(data) {
        Ok(img) => Some(
            img.resize_exact(width, height, FilterType::Triangle)
                .to_luma8()
                .into_raw(),
        ),
        Err(e) => {
            debug!(error = %e, "Cannot decode image for perceptual hash");
            None
        }
    }
}
