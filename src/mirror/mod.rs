//! Mirror module: runs selected units through extraction and download
//!
//! This module contains the coordinator that ties together the page session,
//! the link pass, the fetch pipeline, progress display and the missing report.

mod coordinator;

pub use coordinator::{Coordinator, RunOptions, RunSummary, Unit};
