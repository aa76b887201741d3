//! Backfill limits.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

/// Default number of consecutive missing strips before a scan stops.
/// Zero means scans never stop early.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 3;

/// Default number of backfill tasks per source per run.
pub const DEFAULT_MAX_PER_DAY: usize = 50;

/// Default number of days to look back.
pub const DEFAULT_MAX_DAYS_BACK: u32 = 365;

/// Per-source overrides. Unset values fall back to the global defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLimits {
    pub max_per_day: Option<usize>,
    pub max_days_back: Option<u32>,
    pub enabled: bool,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            max_per_day: None,
            max_days_back: None,
            enabled: true,
        }
    }
}

/// Backfill configuration collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    /// Master switch. When off the planner produces no tasks.
    pub enabled: bool,
    pub max_consecutive_failures: usize,
    pub default_max_per_day: usize,
    pub default_max_days_back: u32,
    pub sources: HashMap<String, SourceLimits>,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            default_max_per_day: DEFAULT_MAX_PER_DAY,
            default_max_days_back: DEFAULT_MAX_DAYS_BACK,
            sources: HashMap::new(),
        }
    }
}

impl BackfillConfig {
    /// Set the limits for one source.
    pub fn with_source(mut self, source: impl Into<String>, limits: SourceLimits) -> Self {
        self.sources.insert(source.into(), limits);
        self
    }

    pub fn max_per_day_for(&self, source: &str) -> usize {
        self.sources
            .get(source)
            .and_then(|limits| limits.max_per_day)
            .unwrap_or(self.default_max_per_day)
    }

    pub fn max_days_back_for(&self, source: &str) -> u32 {
        self.sources
            .get(source)
            .and_then(|limits| limits.max_days_back)
            .unwrap_or(self.default_max_days_back)
    }

    /// Whether backfill may run for `source`.
    pub fn is_source_enabled(&self, source: &str) -> bool {
        self.enabled && self.sources.get(source).map_or(true, |limits| limits.enabled)
    }

    /// Oldest date a backfill for `source` may reach, relative to `today`.
    ///
    /// A look-back reaching past the calendar's range clamps to
    /// [`NaiveDate::MIN`].
    pub fn earliest_allowed_date(&self, source: &str, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_signed(Duration::days(i64::from(self.max_days_back_for(source))))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Whether `consecutive_missing` misses end a scan. A threshold of 0
    /// disables early stopping.
    pub fn stops_after(&self, consecutive_missing: usize) -> bool {
        self.max_consecutive_failures > 0 && consecutive_missing >= self.max_consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let config = BackfillConfig::default().with_source(
            "slow",
            SourceLimits {
                max_per_day: Some(5),
                max_days_back: None,
                enabled: true,
            },
        );

        assert_eq!(config.max_per_day_for("slow"), 5);
        assert_eq!(config.max_days_back_for("slow"), DEFAULT_MAX_DAYS_BACK);
        assert_eq!(config.max_per_day_for("other"), DEFAULT_MAX_PER_DAY);
    }

    #[test]
    fn test_source_enabled() {
        let mut config = BackfillConfig::default().with_source(
            "off",
            SourceLimits {
                enabled: false,
                ..SourceLimits::default()
            },
        );
        assert!(!config.is_source_enabled("off"));
        assert!(config.is_source_enabled("on"));

        config.enabled = false;
        assert!(!config.is_source_enabled("on"));
    }

    #[test]
    fn test_earliest_allowed_date() {
        let config = BackfillConfig::default().with_source(
            "short",
            SourceLimits {
                max_days_back: Some(10),
                ..SourceLimits::default()
            },
        );
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            config.earliest_allowed_date("short", today),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_earliest_allowed_date_clamps_huge_lookback() {
        let config = BackfillConfig {
            default_max_days_back: u32::MAX,
            ..BackfillConfig::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(config.earliest_allowed_date("any", today), NaiveDate::MIN);
    }

    #[test]
    fn test_zero_threshold_never_stops() {
        let mut config = BackfillConfig::default();
        assert!(!config.stops_after(2));
        assert!(config.stops_after(3));

        config.max_consecutive_failures = 0;
        assert!(!config.stops_after(0));
        assert!(!config.stops_after(10_000));
    }
}
