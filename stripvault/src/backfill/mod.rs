//! Backfill: finding and fetching strips missing from the archive.
//!
//! The [`BackfillPlanner`] decides which `(comic, date)` pairs are worth
//! fetching, bounded by the per-source limits in [`BackfillConfig`]. The
//! [`BackfillRunner`] executes the resulting tasks.

mod config;
mod planner;
mod runner;

pub use config::{
    BackfillConfig, SourceLimits, DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_MAX_DAYS_BACK,
    DEFAULT_MAX_PER_DAY,
};
pub use planner::{BackfillPlanner, BackfillTask, StripLookup};
pub use runner::{BackfillReport, BackfillRunner, TaskStatus};
