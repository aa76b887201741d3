//! Concurrent saves and navigation against one archive.

mod common;

use std::sync::Arc;
use std::thread;

use chrono::{Duration, NaiveDate};
use stripvault::archive::ArchiveLayout;
use stripvault::comic::ComicIdentity;
use stripvault::dedupe::HashAlgorithm;
use stripvault::index::IndexStore;
use tempfile::TempDir;

use common::{strip_png, writer};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn parallel_saves_all_land_in_index() {
    let temp = TempDir::new().unwrap();
    let writer = writer(&temp, HashAlgorithm::Sha256);
    let comics: Vec<ComicIdentity> = (1..=3)
        .map(|id| ComicIdentity::new(id, format!("Parallel {}", id)))
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let writer = Arc::clone(&writer);
            let comics = comics.clone();
            thread::spawn(move || {
                for n in 0..10u32 {
                    let day = worker * 10 + n;
                    let date = start() + Duration::days(i64::from(day));
                    let comic = &comics[(day % 3) as usize];
                    let outcome = writer
                        .save_strip(comic, date, &strip_png(110, 55, day as u8))
                        .unwrap();
                    assert!(outcome.is_saved());

                    // Readers run alongside writers.
                    assert!(writer.index().get_newest_date(comic).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total: usize = comics
        .iter()
        .map(|comic| writer.index().all_dates(comic).len())
        .sum();
    assert_eq!(total, 80);

    // The persisted files agree with memory.
    let reopened = IndexStore::new(ArchiveLayout::new(temp.path()));
    for comic in &comics {
        assert_eq!(reopened.all_dates(comic), writer.index().all_dates(comic));
    }
}

#[test]
fn racing_identical_strips_save_once() {
    let temp = TempDir::new().unwrap();
    let writer = writer(&temp, HashAlgorithm::Sha256);
    let comic = ComicIdentity::new(9, "Racer");
    let bytes = Arc::new(strip_png(130, 65, 77));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let writer = Arc::clone(&writer);
            let comic = comic.clone();
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || {
                let date = start() + Duration::days(i);
                writer.save_strip(&comic, date, &bytes).unwrap().is_saved()
            })
        })
        .collect();

    let saved = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|saved| *saved)
        .count();

    assert_eq!(saved, 1);
    assert_eq!(writer.index().all_dates(&comic).len(), 1);
}
