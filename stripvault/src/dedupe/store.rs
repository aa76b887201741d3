//! Year-partitioned persistent hash store.

use std::collections::HashMap;
use std::io;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::ImageHashRecord;
use crate::archive::persist::{read_json, write_json_atomic};
use crate::archive::ArchiveLayout;
use crate::comic::ComicIdentity;
use crate::index::LockRegistry;

/// Hash → record map for one `(comic, year)`.
pub type HashPartition = HashMap<String, ImageHashRecord>;

type PartitionSlot = Mutex<Option<HashPartition>>;

/// Persistent content-hash map, one file per `(comic, year)`.
///
/// Each partition is loaded lazily and cached independently. All access to a
/// partition goes through its mutex, so two saves completing concurrently for
/// the same comic and year cannot lose each other's records.
pub struct DuplicateHashStore {
    layout: ArchiveLayout,
    partitions: LockRegistry<(u32, i32), PartitionSlot>,
}

impl DuplicateHashStore {
    pub fn new(layout: ArchiveLayout) -> Self {
        Self {
            layout,
            partitions: LockRegistry::new(),
        }
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Look up a record by hash.
    pub fn find_by_hash(&self, comic: &ComicIdentity, year: i32, hash: &str) -> Option<ImageHashRecord> {
        self.with_partition(comic, year, |partition| partition.get(hash).cloned())
    }

    /// Insert a record and persist the whole partition.
    pub fn add_hash(&self, comic: &ComicIdentity, year: i32, record: ImageHashRecord) -> io::Result<()> {
        self.with_partition(comic, year, |partition| {
            debug!(comic = %comic, year, hash = %record.hash, "Recording image hash");
            partition.insert(record.hash.clone(), record);
            self.persist(comic, year, partition)
        })
    }

    /// Overwrite a partition wholesale (rehash and migration tooling).
    pub fn replace_all(&self, comic: &ComicIdentity, year: i32, records: HashPartition) -> io::Result<()> {
        self.with_partition(comic, year, |partition| {
            *partition = records;
            self.persist(comic, year, partition)
        })
    }

    /// Copy of a partition's records.
    pub fn snapshot(&self, comic: &ComicIdentity, year: i32) -> HashPartition {
        self.with_partition(comic, year, |partition| partition.clone())
    }

    /// Drop every cached partition of a comic.
    pub fn evict_comic(&self, comic_id: u32) {
        for key in self.partitions.keys_matching(|(id, _)| *id == comic_id) {
            if let Some(slot) = self.partitions.peek(&key) {
                *slot.lock() = None;
            }
        }
    }

    fn with_partition<R>(
        &self,
        comic: &ComicIdentity,
        year: i32,
        f: impl FnOnce(&mut HashPartition) -> R,
    ) -> R {
        let slot = self.partitions.get(&(comic.id, year));
        let mut guard = slot.lock();
        let partition = match guard.take() {
            Some(partition) => partition,
            None => self.load(comic, year),
        };
        f(guard.insert(partition))
    }

    fn load(&self, comic: &ComicIdentity, year: i32) -> HashPartition {
        let path = self.layout.hash_path(comic, year);
        match read_json::<HashPartition>(&path) {
            Ok(partition) => partition,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashPartition::new(),
            Err(e) => {
                warn!(
                    comic = %comic,
                    year,
                    path = %path.display(),
                    error = %e,
                    "Unreadable hash partition, starting empty"
                );
                HashPartition::new()
            }
        }
    }

    fn persist(&self, comic: &ComicIdentity, year: i32, partition: &HashPartition) -> io::Result<()> {
        let path = self.layout.hash_path(comic, year);
        write_json_atomic(&path, partition).inspect_err(|e| {
            warn!(comic = %comic, year, path = %path.display(), error = %e, "Failed to persist hash partition");
        })
    }
}
