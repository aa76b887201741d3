//! Missing-strip planning.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::BackfillConfig;
use crate::archive::ArchiveWriter;
use crate::comic::{ComicIdentity, ComicItem};

/// Answers whether a strip is already archived.
pub trait StripLookup: Send + Sync {
    fn strip_exists(&self, comic: &ComicIdentity, date: NaiveDate) -> bool;
}

impl StripLookup for ArchiveWriter {
    fn strip_exists(&self, comic: &ComicIdentity, date: NaiveDate) -> bool {
        ArchiveWriter::strip_exists(self, comic, date)
    }
}

/// One (comic, date) pair to fetch. Produced and consumed within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillTask {
    pub comic: ComicItem,
    pub date: NaiveDate,
}

/// Computes which strips are plausibly missing from the archive.
pub struct BackfillPlanner {
    config: BackfillConfig,
    lookup: Arc<dyn StripLookup>,
}

impl BackfillPlanner {
    pub fn new(config: BackfillConfig, lookup: Arc<dyn StripLookup>) -> Self {
        Self { config, lookup }
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Plan backfill tasks for `comics` as of `today`.
    ///
    /// Each comic is scanned backwards from its start date towards the
    /// oldest allowed date. A scan stops early after
    /// `max_consecutive_failures` missing publication days in a row (never,
    /// when that is 0), and no
    /// source ever receives more than its `max_per_day` tasks. Tasks for one
    /// comic are returned newest first.
    pub fn find_missing_strips(&self, comics: &[ComicItem], today: NaiveDate) -> Vec<BackfillTask> {
        if !self.config.enabled {
            debug!("Backfill disabled");
            return Vec::new();
        }

        let mut tasks = Vec::new();
        let mut per_source: HashMap<&str, usize> = HashMap::new();

        let candidates = comics.iter().filter(|comic| {
            comic.enabled && !comic.source.is_empty() && self.config.is_source_enabled(&comic.source)
        });

        for comic in candidates {
            let quota = self.config.max_per_day_for(&comic.source);
            let used = per_source.entry(comic.source.as_str()).or_insert(0);
            if *used >= quota {
                debug!(comic = %comic.name, source = %comic.source, quota, "Source quota reached, skipping comic");
                continue;
            }

            let Some((start, end)) = self.scan_window(comic, today) else {
                debug!(comic = %comic.name, "No valid backfill window");
                continue;
            };

            let before = tasks.len();
            self.scan_comic(comic, start, end, quota, used, &mut tasks);
            let planned = tasks.len() - before;
            if planned > 0 {
                debug!(comic = %comic.name, planned, %start, %end, "Planned backfill");
            }
        }

        info!(tasks = tasks.len(), "Backfill planning complete");
        tasks
    }

    /// `[end, start]` range to scan, or `None` if it is empty.
    fn scan_window(&self, comic: &ComicItem, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = match comic.newest {
            Some(newest) if !comic.active && newest < today => newest,
            _ => today,
        };

        let earliest = self.config.earliest_allowed_date(&comic.source, today);
        let end = match comic.oldest {
            Some(oldest) => oldest.max(earliest),
            None => earliest,
        };

        (start >= end).then_some((start, end))
    }

    fn scan_comic(
        &self,
        comic: &ComicItem,
        start: NaiveDate,
        end: NaiveDate,
        quota: usize,
        used: &mut usize,
        tasks: &mut Vec<BackfillTask>,
    ) {
        let identity = comic.identity();
        let mut consecutive_missing = 0;
        let mut date = start;

        while date >= end && *used < quota {
            if comic.publishes_on(date) {
                if self.lookup.strip_exists(&identity, date) {
                    consecutive_missing = 0;
                } else {
                    tasks.push(BackfillTask {
                        comic: comic.clone(),
                        date,
                    });
                    *used += 1;
                    consecutive_missing += 1;

                    if self.config.stops_after(consecutive_missing) {
                        debug!(
                            comic = %comic.name,
                            %date,
                            consecutive_missing,
                            "Stopping scan, comic probably did not publish this far back"
                        );
                        break;
                    }
                }
            }

            match date.pred_opt() {
                Some(previous) => date = previous,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backfill::{SourceLimits, DEFAULT_MAX_PER_DAY};
    use chrono::Weekday;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct FakeArchive {
        present: HashSet<(u32, NaiveDate)>,
    }

    impl FakeArchive {
        fn with(mut self, id: u32, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
            self.present.extend(dates.into_iter().map(|d| (id, d)));
            self
        }
    }

    impl StripLookup for FakeArchive {
        fn strip_exists(&self, comic: &ComicIdentity, date: NaiveDate) -> bool {
            self.present.contains(&(comic.id, date))
        }
    }

    fn planner(config: BackfillConfig, archive: FakeArchive) -> BackfillPlanner {
        BackfillPlanner::new(config, Arc::new(archive))
    }

    fn days(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days().take_while(|d| *d <= to).collect()
    }

    #[test]
    fn test_early_stop_after_consecutive_missing() {
        let today = date(2024, 6, 10);
        // 2024-06-06 ..= 2024-06-10 missing, everything older present.
        let archive = FakeArchive::default().with(1, days(date(2024, 1, 1), date(2024, 6, 5)));
        let comics = vec![ComicItem::new(1, "Gappy", "src")];

        let tasks = planner(BackfillConfig::default(), archive).find_missing_strips(&comics, today);

        let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date(2024, 6, 10), date(2024, 6, 9), date(2024, 6, 8)]);
    }

    #[test]
    fn test_counter_resets_on_found_strip() {
        let today = date(2024, 6, 10);
        let archive = FakeArchive::default()
            .with(1, [date(2024, 6, 8)])
            .with(1, days(date(2023, 1, 1), date(2024, 6, 5)));
        let comics = vec![ComicItem::new(1, "Holey", "src")];

        let tasks = planner(BackfillConfig::default(), archive).find_missing_strips(&comics, today);

        let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 6, 10), date(2024, 6, 9), date(2024, 6, 7), date(2024, 6, 6)]
        );
    }

    #[test]
    fn test_source_quota_shared_across_comics() {
        let today = date(2024, 6, 10);
        let config = BackfillConfig {
            max_consecutive_failures: 100,
            ..BackfillConfig::default()
        }
        .with_source(
            "limited",
            SourceLimits {
                max_per_day: Some(4),
                ..SourceLimits::default()
            },
        );
        let comics = vec![
            ComicItem::new(1, "First", "limited"),
            ComicItem::new(2, "Second", "limited"),
            ComicItem::new(3, "Elsewhere", "other"),
        ];

        let tasks = planner(config, FakeArchive::default()).find_missing_strips(&comics, today);

        let limited = tasks.iter().filter(|t| t.comic.source == "limited").count();
        assert_eq!(limited, 4);
        assert!(tasks.iter().all(|t| t.comic.id != 2));
        assert_eq!(tasks.iter().filter(|t| t.comic.id == 3).count(), DEFAULT_MAX_PER_DAY);
    }

    #[test]
    fn test_publication_days_respected() {
        let today = date(2024, 6, 10); // Monday
        let comics = vec![ComicItem::new(1, "Sunday Only", "src").with_publication_days(vec![Weekday::Sun])];

        let tasks = planner(BackfillConfig::default(), FakeArchive::default()).find_missing_strips(&comics, today);

        let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date(2024, 6, 9), date(2024, 6, 2), date(2024, 5, 26)]);
    }

    #[test]
    fn test_discontinued_comic_starts_at_last_strip() {
        let today = date(2024, 6, 10);
        let comics = vec![ComicItem::new(1, "Ended", "src")
            .with_date_range(None, Some(date(2020, 1, 31)))
            .discontinued()];

        let tasks = planner(
            BackfillConfig {
                default_max_days_back: 10_000,
                ..BackfillConfig::default()
            },
            FakeArchive::default(),
        )
        .find_missing_strips(&comics, today);

        assert_eq!(tasks.first().map(|t| t.date), Some(date(2020, 1, 31)));
    }

    #[test]
    fn test_window_bounded_by_oldest_and_max_days_back() {
        let today = date(2024, 6, 10);
        let config = BackfillConfig {
            max_consecutive_failures: 1000,
            default_max_days_back: 5,
            ..BackfillConfig::default()
        };
        let comics = vec![
            ComicItem::new(1, "Recent", "src").with_date_range(Some(date(2024, 6, 8)), None),
            ComicItem::new(2, "Old", "src"),
        ];

        let tasks = planner(config, FakeArchive::default()).find_missing_strips(&comics, today);

        assert_eq!(tasks.iter().filter(|t| t.comic.id == 1).count(), 3);
        assert_eq!(tasks.iter().filter(|t| t.comic.id == 2).count(), 6);
    }

    #[test]
    fn test_empty_window_skipped() {
        let today = date(2024, 6, 10);
        let comics = vec![ComicItem::new(1, "Future", "src").with_date_range(Some(date(2024, 7, 1)), None)];

        let tasks = planner(BackfillConfig::default(), FakeArchive::default()).find_missing_strips(&comics, today);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_filters_disabled_comics_and_sources() {
        let today = date(2024, 6, 10);
        let mut disabled = ComicItem::new(1, "Disabled", "src");
        disabled.enabled = false;
        let comics = vec![
            disabled,
            ComicItem::new(2, "No Source", ""),
            ComicItem::new(3, "Off Source", "off"),
        ];
        let config = BackfillConfig::default().with_source(
            "off",
            SourceLimits {
                enabled: false,
                ..SourceLimits::default()
            },
        );

        assert!(planner(config, FakeArchive::default())
            .find_missing_strips(&comics, today)
            .is_empty());

        let off = BackfillConfig {
            enabled: false,
            ..BackfillConfig::default()
        };
        let comics = vec![ComicItem::new(4, "Fine", "src")];
        assert!(planner(off, FakeArchive::default())
            .find_missing_strips(&comics, today)
            .is_empty());
    }

    #[test]
    fn test_early_stop_capped_by_remaining_quota() {
        let today = date(2024, 6, 10);
        let config = BackfillConfig::default().with_source(
            "tight",
            SourceLimits {
                max_per_day: Some(2),
                ..SourceLimits::default()
            },
        );
        let comics = vec![
            ComicItem::new(1, "Gappy", "tight"),
            ComicItem::new(2, "Also Gappy", "tight"),
        ];

        let tasks = planner(config, FakeArchive::default()).find_missing_strips(&comics, today);

        let planned: Vec<(u32, NaiveDate)> = tasks.iter().map(|t| (t.comic.id, t.date)).collect();
        assert_eq!(planned, vec![(1, date(2024, 6, 10)), (1, date(2024, 6, 9))]);
    }

    #[test]
    fn test_zero_threshold_scans_whole_window() {
        let today = date(2024, 6, 10);
        let config = BackfillConfig {
            max_consecutive_failures: 0,
            default_max_days_back: 6,
            ..BackfillConfig::default()
        };
        let comics = vec![ComicItem::new(1, "Sparse", "src")];

        let tasks = planner(config, FakeArchive::default()).find_missing_strips(&comics, today);

        let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.date).collect();
        assert_eq!(dates, days(date(2024, 6, 4), today).into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_huge_lookback_does_not_panic() {
        let today = date(2024, 6, 10);
        let config = BackfillConfig {
            default_max_days_back: u32::MAX,
            ..BackfillConfig::default()
        };
        let comics = vec![ComicItem::new(1, "Ancient", "src")];

        let tasks = planner(config, FakeArchive::default()).find_missing_strips(&comics, today);

        let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date(2024, 6, 10), date(2024, 6, 9), date(2024, 6, 8)]);
    }
}
