//! CLI subcommand implementations.

pub mod backfill;
pub mod common;
pub mod config;
pub mod daemon;
pub mod index;
pub mod rehash;
pub mod status;
pub mod today;
