//! Command handlers for the CLI.
//!
//! These are called from `main` after the database pool, config, and
//! provider registry are established. Per-domain failures inside bulk
//! operations are logged and skipped rather than propagated so a single
//! bad domain does not abort the full run.

pub mod drain;
pub mod queue;
pub mod report;
pub mod seed;
