//! The persisted per-comic date index.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sorted, duplicate-free list of the dates archived for one comic.
///
/// Serialized as `available-dates.json`:
///
/// ```json
/// {"comicId": 7, "comicName": "Adam At Home",
///  "availableDates": ["2024-01-10", "2024-01-15"], "lastUpdated": "2024-01-16"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicDateIndex {
    pub comic_id: u32,
    pub comic_name: String,
    #[serde(default)]
    available_dates: Vec<NaiveDate>,
    pub last_updated: NaiveDate,
}

impl ComicDateIndex {
    /// An empty index.
    pub fn empty(comic_id: u32, comic_name: impl Into<String>) -> Self {
        Self {
            comic_id,
            comic_name: comic_name.into(),
            available_dates: Vec::new(),
            last_updated: Local::now().date_naive(),
        }
    }

    /// Build an index from dates in any order; duplicates are dropped.
    pub fn from_dates(
        comic_id: u32,
        comic_name: impl Into<String>,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        let mut index = Self::empty(comic_id, comic_name);
        index.available_dates = dates.into_iter().collect();
        index.normalize();
        index
    }

    /// Restore the sorted/unique invariant after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.available_dates.sort_unstable();
        self.available_dates.dedup();
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.available_dates
    }

    pub fn len(&self) -> usize {
        self.available_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available_dates.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.available_dates.binary_search(&date).is_ok()
    }

    /// Smallest date strictly after `from`.
    pub fn next_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        let position = match self.available_dates.binary_search(&from) {
            Ok(found) => found + 1,
            Err(insertion) => insertion,
        };
        self.available_dates.get(position).copied()
    }

    /// Largest date strictly before `from`.
    pub fn previous_before(&self, from: NaiveDate) -> Option<NaiveDate> {
        let position = match self.available_dates.binary_search(&from) {
            Ok(found) | Err(found) => found,
        };
        position
            .checked_sub(1)
            .and_then(|p| self.available_dates.get(p).copied())
    }

    pub fn newest(&self) -> Option<NaiveDate> {
        self.available_dates.last().copied()
    }

    pub fn oldest(&self) -> Option<NaiveDate> {
        self.available_dates.first().copied()
    }

    /// Insert `date` at its sorted position. Returns `false` if already present.
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        match self.available_dates.binary_search(&date) {
            Ok(_) => false,
            Err(insertion) => {
                self.available_dates.insert(insertion, date);
                self.touch();
                true
            }
        }
    }

    /// Remove `date`. Returns `false` if it was not present.
    pub fn remove(&mut self, date: NaiveDate) -> bool {
        match self.available_dates.binary_search(&date) {
            Ok(found) => {
                self.available_dates.remove(found);
                self.touch();
                true
            }
            Err(_) => false,
        }
    }

    fn touch(&mut self) {
        self.last_updated = Local::now().date_naive();
    }
}
