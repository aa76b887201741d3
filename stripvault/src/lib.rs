//! StripVault - daily comic strip acquisition and archiving
//!
//! This library provides the acquisition and indexing engine behind the
//! `stripvault` command-line tool:
//!
//! - [`index`] - persistent, per-comic sorted date index for fast navigation
//! - [`dedupe`] - content-hash store that prevents re-published strips from
//!   being archived twice
//! - [`archive`] - the save pipeline tying validation, dedup, file write and
//!   index update together
//! - [`downloader`] - per-source strategy dispatch with failure classification
//! - [`backfill`] - planner computing which (comic, date) pairs are missing
//!
//! The remaining modules ([`config`], [`logging`], [`service`]) provide the
//! ambient wiring used by the CLI.

pub mod analysis;
pub mod archive;
pub mod backfill;
pub mod comic;
pub mod config;
pub mod dedupe;
pub mod downloader;
pub mod index;
pub mod logging;
pub mod service;
pub mod validation;

/// StripVault library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
