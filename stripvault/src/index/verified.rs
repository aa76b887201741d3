//! Verified-empty markers.

use dashmap::DashSet;

/// Comic ids whose archive was rebuilt from disk and found to hold no strips.
///
/// This is the one piece of deliberately process-scoped state in the engine.
/// It is not a static: one instance is created per [`IndexStore`] (or shared
/// explicitly via `Arc`) and lives as long as the service does. A marker
/// suppresses further filesystem rebuilds for that comic until
/// [`clear`](Self::clear) is called by a successful `add_date` or by
/// invalidation.
///
/// [`IndexStore`]: super::IndexStore
#[derive(Debug, Default)]
pub struct VerifiedEmptySet {
    ids: DashSet<u32>,
}

impl VerifiedEmptySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, comic_id: u32) {
        self.ids.insert(comic_id);
    }

    pub fn contains(&self, comic_id: u32) -> bool {
        self.ids.contains(&comic_id)
    }

    /// Re-arm rebuilds for a comic. Returns whether a marker was present.
    pub fn clear(&self, comic_id: u32) -> bool {
        self.ids.remove(&comic_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
