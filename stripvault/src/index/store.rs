//! Cached, persistent date index per comic.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{ComicDateIndex, LockRegistry, VerifiedEmptySet};
use crate::analysis::MetadataRepository;
use crate::archive::persist::{read_json, write_json_atomic};
use crate::archive::ArchiveLayout;
use crate::comic::ComicIdentity;

type IndexSlot = RwLock<Option<ComicDateIndex>>;

/// Navigation and maintenance of the per-comic date indexes.
///
/// Each comic id owns one reader/writer lock guarding its cached index. The
/// cache slot is filled lazily on first access: load `available-dates.json`,
/// else rebuild from the image files on disk, else start empty. Reads of one
/// comic run concurrently; writes to one comic exclude its readers but never
/// block other comics.
///
/// Persistence failures are logged and never surface to navigation callers.
pub struct IndexStore {
    layout: ArchiveLayout,
    slots: LockRegistry<u32, IndexSlot>,
    verified_empty: Arc<VerifiedEmptySet>,
    metadata: MetadataRepository,
}

impl IndexStore {
    /// Create a store with its own verified-empty set.
    pub fn new(layout: ArchiveLayout) -> Self {
        Self::with_verified_empty(layout, Arc::new(VerifiedEmptySet::new()))
    }

    /// Create a store sharing an existing verified-empty set.
    pub fn with_verified_empty(layout: ArchiveLayout, verified_empty: Arc<VerifiedEmptySet>) -> Self {
        Self {
            layout,
            slots: LockRegistry::new(),
            verified_empty,
            metadata: MetadataRepository::new(),
        }
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    pub fn verified_empty(&self) -> &Arc<VerifiedEmptySet> {
        &self.verified_empty
    }

    /// Smallest archived date strictly after `from`.
    pub fn get_next_date(&self, comic: &ComicIdentity, from: NaiveDate) -> Option<NaiveDate> {
        self.with_index(comic, |index| index.next_after(from))
    }

    /// Largest archived date strictly before `from`.
    pub fn get_previous_date(&self, comic: &ComicIdentity, from: NaiveDate) -> Option<NaiveDate> {
        self.with_index(comic, |index| index.previous_before(from))
    }

    pub fn get_newest_date(&self, comic: &ComicIdentity) -> Option<NaiveDate> {
        self.with_index(comic, ComicDateIndex::newest)
    }

    pub fn get_oldest_date(&self, comic: &ComicIdentity) -> Option<NaiveDate> {
        self.with_index(comic, ComicDateIndex::oldest)
    }

    pub fn contains(&self, comic: &ComicIdentity, date: NaiveDate) -> bool {
        self.with_index(comic, |index| index.contains(date))
    }

    /// Every archived date, ascending.
    pub fn all_dates(&self, comic: &ComicIdentity) -> Vec<NaiveDate> {
        self.with_index(comic, |index| index.dates().to_vec())
    }

    /// Record `date` as archived.
    ///
    /// Returns `true` if the date was new. A new date is persisted and clears
    /// the comic's verified-empty marker; a known date is a no-op.
    pub fn add_date(&self, comic: &ComicIdentity, date: NaiveDate) -> bool {
        let added = self.with_index_mut(comic, |index| index.insert(date));
        if added {
            self.verified_empty.clear(comic.id);
            debug!(comic = %comic, %date, "Added date to index");
        }
        added
    }

    /// Forget `date`. Returns `true` if it was present.
    pub fn remove_date(&self, comic: &ComicIdentity, date: NaiveDate) -> bool {
        let removed = self.with_index_mut(comic, |index| index.remove(date));
        if removed {
            debug!(comic = %comic, %date, "Removed date from index");
        }
        removed
    }

    /// Drop the cached index and verified-empty marker for a comic.
    ///
    /// The comic's lock stays registered; the next access reloads from disk.
    pub fn invalidate(&self, comic_id: u32) {
        if let Some(slot) = self.slots.peek(&comic_id) {
            *slot.write() = None;
        }
        self.verified_empty.clear(comic_id);
        debug!(comic_id, "Invalidated date index");
    }

    /// Rebuild a comic's index from the files on disk and persist it.
    ///
    /// With `validate_metadata`, each strip's sidecar is checked for a
    /// matching comic id; mismatches are logged and do not fail the rebuild.
    /// Returns the number of dates found.
    pub fn rebuild_index(&self, comic: &ComicIdentity, validate_metadata: bool) -> usize {
        let slot = self.slots.get(&comic.id);
        let mut guard = slot.write();

        let index = self.scan(comic, validate_metadata);
        self.persist(comic, &index);
        self.mark_emptiness(comic.id, &index);

        let count = index.len();
        *guard = Some(index);
        info!(comic = %comic, dates = count, "Rebuilt date index");
        count
    }

    fn with_index<R>(&self, comic: &ComicIdentity, f: impl FnOnce(&ComicDateIndex) -> R) -> R {
        let slot = self.slots.get(&comic.id);
        {
            let guard = slot.read();
            if let Some(index) = guard.as_ref() {
                return f(index);
            }
        }

        let mut guard = slot.write();
        let index = match guard.take() {
            Some(index) => index,
            None => self.load_or_rebuild(comic),
        };
        f(guard.insert(index))
    }

    /// Apply a mutation under the write lock, persisting when it reports a change.
    fn with_index_mut(
        &self,
        comic: &ComicIdentity,
        f: impl FnOnce(&mut ComicDateIndex) -> bool,
    ) -> bool {
        let slot = self.slots.get(&comic.id);
        let mut guard = slot.write();
        let index = match guard.take() {
            Some(index) => index,
            None => self.load_or_rebuild(comic),
        };
        let index = guard.insert(index);

        let changed = f(index);
        if changed {
            self.persist(comic, index);
        }
        changed
    }

    /// Fill an empty cache slot. Caller holds the write lock.
    fn load_or_rebuild(&self, comic: &ComicIdentity) -> ComicDateIndex {
        let path = self.layout.index_path(comic);
        match read_json::<ComicDateIndex>(&path) {
            Ok(mut index) => {
                index.normalize();
                if !index.is_empty() {
                    debug!(comic = %comic, dates = index.len(), "Loaded date index");
                    return index;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    comic = %comic,
                    path = %path.display(),
                    error = %e,
                    "Unreadable date index, rebuilding"
                );
            }
        }

        if self.verified_empty.contains(comic.id) {
            return ComicDateIndex::empty(comic.id, &comic.name);
        }

        let index = self.scan(comic, false);
        // Do not create directories for comics that have never been archived.
        if !index.is_empty() || self.layout.comic_dir(comic).is_dir() {
            self.persist(comic, &index);
        }
        self.mark_emptiness(comic.id, &index);
        info!(comic = %comic, dates = index.len(), "Built date index from archive");
        index
    }

    fn mark_emptiness(&self, comic_id: u32, index: &ComicDateIndex) {
        if index.is_empty() {
            self.verified_empty.mark(comic_id);
        } else {
            self.verified_empty.clear(comic_id);
        }
    }

    /// Collect strip dates from the comic's directory tree.
    fn scan(&self, comic: &ComicIdentity, validate_metadata: bool) -> ComicDateIndex {
        let root = self.layout.comic_dir(comic);
        let mut dates = Vec::new();
        let mut pending: Vec<PathBuf> = vec![root];

        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Cannot read archive directory");
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };

                if file_type.is_dir() {
                    if !ArchiveLayout::is_reserved(&entry.file_name()) {
                        pending.push(path);
                    }
                    continue;
                }

                if let Some(date) = ArchiveLayout::strip_date(&path) {
                    if validate_metadata {
                        self.check_metadata(comic, &path);
                    }
                    dates.push(date);
                }
            }
        }

        ComicDateIndex::from_dates(comic.id, &comic.name, dates)
    }

    fn check_metadata(&self, comic: &ComicIdentity, image: &Path) {
        match self.metadata.load(image) {
            Some(metadata) if metadata.comic_id != comic.id => {
                warn!(
                    comic = %comic,
                    path = %image.display(),
                    found_comic_id = metadata.comic_id,
                    "Sidecar metadata belongs to a different comic"
                );
            }
            Some(_) => {}
            None => debug!(path = %image.display(), "No sidecar metadata"),
        }
    }

    fn persist(&self, comic: &ComicIdentity, index: &ComicDateIndex) {
        let path = self.layout.index_path(comic);
        if let Err(e) = write_json_atomic(&path, index) {
            warn!(comic = %comic, path = %path.display(), error = %e, "Failed to persist date index");
        }
    }
}
