//! Duplicate detection on top of the hash store.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use dashmap::DashSet;
use tracing::{debug, info, warn};

use super::{hasher_for, DuplicateHashStore, HashAlgorithm, HashPartition, ImageHashRecord, ImageHasher};
use crate::archive::ArchiveLayout;
use crate::comic::ComicIdentity;

/// Finds previously archived copies of a strip by content hash.
///
/// The first time a `(comic, year)` partition is consulted in this process it
/// is reconciled with the files on disk: an empty partition is backfilled by
/// hashing the year's existing strips, and a partition written with another
/// algorithm is rebuilt with the configured one.
pub struct DuplicateDetector {
    store: Arc<DuplicateHashStore>,
    hasher: Arc<dyn ImageHasher>,
    reconciled: DashSet<(u32, i32)>,
}

impl DuplicateDetector {
    pub fn new(store: Arc<DuplicateHashStore>, algorithm: HashAlgorithm) -> Self {
        Self::with_hasher(store, hasher_for(algorithm))
    }

    pub fn with_hasher(store: Arc<DuplicateHashStore>, hasher: Arc<dyn ImageHasher>) -> Self {
        Self {
            store,
            hasher,
            reconciled: DashSet::new(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    pub fn store(&self) -> &Arc<DuplicateHashStore> {
        &self.store
    }

    /// Hash image bytes with the configured algorithm.
    pub fn hash(&self, data: &[u8]) -> Option<String> {
        self.hasher.hash(data)
    }

    /// Existing record with `hash` in the partition of `date`'s year.
    pub fn find_duplicate(
        &self,
        comic: &ComicIdentity,
        date: NaiveDate,
        hash: &str,
    ) -> Option<ImageHashRecord> {
        let year = date.year();
        self.reconcile(comic, year);
        self.store.find_by_hash(comic, year, hash)
    }

    /// Record a newly archived strip.
    pub fn record(&self, comic: &ComicIdentity, date: NaiveDate, hash: String, path: &Path) -> io::Result<()> {
        let record = ImageHashRecord::new(date, hash, path, self.algorithm());
        self.store.add_hash(comic, date.year(), record)
    }

    /// Rebuild a year's partition from the strips on disk.
    ///
    /// Returns the number of distinct hashes stored.
    pub fn rehash(&self, comic: &ComicIdentity, year: i32) -> io::Result<usize> {
        let year_dir = self.store.layout().year_dir(comic, year);
        let mut partition = HashPartition::new();

        let entries = match fs::read_dir(&year_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.reconciled.insert((comic.id, year));
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(date) = ArchiveLayout::strip_date(&path) else {
                continue;
            };
            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read strip for hashing");
                    continue;
                }
            };
            match self.hasher.hash(&data) {
                Some(hash) => {
                    partition.insert(
                        hash.clone(),
                        ImageHashRecord::new(date, hash, path, self.algorithm()),
                    );
                }
                None => debug!(path = %path.display(), "Strip could not be hashed"),
            }
        }

        let count = partition.len();
        self.store.replace_all(comic, year, partition)?;
        self.reconciled.insert((comic.id, year));
        info!(comic = %comic, year, hashes = count, algorithm = %self.algorithm(), "Rehashed partition");
        Ok(count)
    }

    /// Forget cached state for a comic whose archive was removed.
    pub fn evict_comic(&self, comic_id: u32) {
        self.store.evict_comic(comic_id);
        self.reconciled.retain(|(id, _)| *id != comic_id);
    }

    fn reconcile(&self, comic: &ComicIdentity, year: i32) {
        if !self.reconciled.insert((comic.id, year)) {
            return;
        }

        let partition = self.store.snapshot(comic, year);
        let algorithm = Some(self.algorithm());
        let stale = partition.values().any(|record| record.algorithm != algorithm);

        if partition.is_empty() || stale {
            if stale {
                info!(comic = %comic, year, algorithm = %self.algorithm(), "Hash algorithm changed, rebuilding partition");
            }
            if let Err(e) = self.rehash(comic, year) {
                warn!(comic = %comic, year, error = %e, "Hash backfill failed");
            }
        }
    }
}
