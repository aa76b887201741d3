//! Per-comic date index.
//!
//! The index answers "which dates exist for this comic" without rescanning
//! the archive. [`IndexStore`] caches one [`ComicDateIndex`] per comic,
//! guarded by a reader/writer lock from a [`LockRegistry`], and persists it to
//! `available-dates.json`. Comics confirmed to have nothing archived are
//! tracked in a [`VerifiedEmptySet`] so the filesystem is not rescanned on
//! every query.

mod locks;
mod store;
mod types;
mod verified;

pub use locks::LockRegistry;
pub use store::IndexStore;
pub use types::ComicDateIndex;
pub use verified::VerifiedEmptySet;
