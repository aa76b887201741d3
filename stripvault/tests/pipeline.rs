//! End-to-end save pipeline tests against a real on-disk archive.

mod common;

use std::io::Cursor;
use std::sync::Arc;

use chrono::NaiveDate;
use image::ImageFormat;
use stripvault::analysis::{sidecar_path, MetadataRepository};
use stripvault::archive::{ArchiveLayout, SaveOutcome, INDEX_FILENAME};
use stripvault::comic::ComicIdentity;
use stripvault::dedupe::{DuplicateDetector, DuplicateHashStore, HashAlgorithm};
use stripvault::index::IndexStore;
use tempfile::TempDir;

use common::{strip_png, writer};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn saved_strips_are_navigable_after_restart() {
    let temp = TempDir::new().unwrap();
    let comic = ComicIdentity::new(7, "Night Shift");

    {
        let writer = writer(&temp, HashAlgorithm::Sha256);
        for (seed, day) in [(1, 3), (2, 1), (3, 10)] {
            let outcome = writer
                .save_strip(&comic, date(2024, 2, day), &strip_png(200, 80, seed))
                .unwrap();
            assert!(outcome.is_saved());
        }
    }

    let layout = ArchiveLayout::new(temp.path());
    assert!(layout.comic_dir(&comic).join(INDEX_FILENAME).exists());

    // A fresh store reads the persisted index instead of scanning.
    let index = IndexStore::new(layout);
    assert_eq!(index.get_oldest_date(&comic), Some(date(2024, 2, 1)));
    assert_eq!(index.get_newest_date(&comic), Some(date(2024, 2, 10)));
    assert_eq!(index.get_next_date(&comic, date(2024, 2, 3)), Some(date(2024, 2, 10)));
    assert_eq!(index.get_previous_date(&comic, date(2024, 2, 3)), Some(date(2024, 2, 1)));
    assert_eq!(index.get_next_date(&comic, date(2024, 2, 10)), None);
}

#[test]
fn saved_strip_gets_metadata_sidecar() {
    let temp = TempDir::new().unwrap();
    let writer = writer(&temp, HashAlgorithm::Sha256);
    let comic = ComicIdentity::new(3, "Sidecar");

    let SaveOutcome::Saved { path } = writer
        .save_strip(&comic, date(2024, 5, 5), &strip_png(160, 90, 4))
        .unwrap()
    else {
        panic!("expected a save");
    };

    assert!(sidecar_path(&path).exists());
    let metadata = MetadataRepository::new().load(&path).unwrap();
    assert_eq!(metadata.comic_id, 3);
    assert_eq!((metadata.width, metadata.height), (160, 90));
}

#[test]
fn identical_bytes_in_different_years_are_both_kept() {
    let temp = TempDir::new().unwrap();
    let writer = writer(&temp, HashAlgorithm::Sha256);
    let comic = ComicIdentity::new(1, "Rerun");
    let bytes = strip_png(120, 60, 9);

    assert!(writer.save_strip(&comic, date(2023, 12, 31), &bytes).unwrap().is_saved());
    assert!(writer.save_strip(&comic, date(2024, 1, 1), &bytes).unwrap().is_saved());
    assert!(writer
        .save_strip(&comic, date(2024, 1, 2), &bytes)
        .unwrap()
        .is_duplicate());

    assert_eq!(writer.index().all_dates(&comic), vec![date(2023, 12, 31), date(2024, 1, 1)]);
}

#[test]
fn perceptual_hash_catches_reencoded_strip() {
    let temp = TempDir::new().unwrap();
    let writer = writer(&temp, HashAlgorithm::AverageHash);
    let comic = ComicIdentity::new(2, "Re-encoded");

    let png = strip_png(180, 90, 21);
    let decoded = image::load_from_memory(&png).unwrap();
    let mut bmp = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut bmp), ImageFormat::Bmp)
        .unwrap();
    assert_ne!(png, bmp);

    assert!(writer.save_strip(&comic, date(2024, 3, 1), &png).unwrap().is_saved());
    let outcome = writer.save_strip(&comic, date(2024, 3, 2), &bmp).unwrap();

    match outcome {
        SaveOutcome::DuplicateSkipped { original, .. } => {
            assert_eq!(ArchiveLayout::strip_date(&original), Some(date(2024, 3, 1)));
        }
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert!(!writer.strip_exists(&comic, date(2024, 3, 2)));
}

#[test]
fn switching_algorithm_rehashes_existing_partition() {
    let temp = TempDir::new().unwrap();
    let comic = ComicIdentity::new(4, "Switcher");
    let first = strip_png(150, 75, 30);

    writer(&temp, HashAlgorithm::Sha256)
        .save_strip(&comic, date(2024, 6, 1), &first)
        .unwrap();

    // The sha256 partition is reconciled to difference hashes on first use.
    let layout = ArchiveLayout::new(temp.path());
    let detector = DuplicateDetector::new(
        Arc::new(DuplicateHashStore::new(layout.clone())),
        HashAlgorithm::DifferenceHash,
    );
    let hash = detector.hash(&first).unwrap();
    let found = detector.find_duplicate(&comic, date(2024, 6, 2), &hash);
    assert_eq!(found.map(|r| r.date), Some(date(2024, 6, 1)));

    let stored = detector.store().snapshot(&comic, 2024);
    assert!(stored
        .values()
        .all(|record| record.algorithm == Some(HashAlgorithm::DifferenceHash)));
}

#[test]
fn rebuild_recovers_from_deleted_index_file() {
    let temp = TempDir::new().unwrap();
    let writer = writer(&temp, HashAlgorithm::Sha256);
    let comic = ComicIdentity::new(5, "Lost Index");
    for day in 1..=4 {
        writer
            .save_strip(&comic, date(2024, 7, day), &strip_png(120, 60, day as u8))
            .unwrap();
    }

    let layout = ArchiveLayout::new(temp.path());
    std::fs::remove_file(layout.index_path(&comic)).unwrap();

    let index = IndexStore::new(layout.clone());
    assert_eq!(index.all_dates(&comic).len(), 4);
    assert!(layout.index_path(&comic).exists());

    assert_eq!(index.rebuild_index(&comic, true), 4);
}
