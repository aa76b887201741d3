//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use stripvault::archive::{ArchiveLayout, ArchiveWriter};
use stripvault::dedupe::{DuplicateDetector, DuplicateHashStore, HashAlgorithm};
use stripvault::index::IndexStore;
use tempfile::TempDir;

/// PNG whose pixels depend on `seed`, so different seeds give different bytes.
pub fn strip_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(width, height, |x, y| {
        let v = ((x * 7 + y * 3) as u8).wrapping_add(seed);
        Rgb([v, seed, v ^ seed])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// A writer over a fresh archive rooted in `temp`.
pub fn writer(temp: &TempDir, algorithm: HashAlgorithm) -> Arc<ArchiveWriter> {
    let layout = ArchiveLayout::new(temp.path());
    let index = Arc::new(IndexStore::new(layout.clone()));
    let detector = Arc::new(DuplicateDetector::new(
        Arc::new(DuplicateHashStore::new(layout)),
        algorithm,
    ));
    Arc::new(ArchiveWriter::new(index, detector))
}
