//! Find jobs of a scheduler session that need to be resubmitted
//!
//! A session file lists the jobs `star-submit` created, where their condor logs are written and
//! where their output ends up. A job needs resubmission when its log shows it was evicted, or
//! when no `*.root` output carries its job id. Files are processed one at a time and jobs in
//! ascending index order.

use std::path::PathBuf;

use thiserror::Error;

/// Extract job count, directories and session id from session files
pub mod session;
/// Decide from a condor log whether a job was evicted
pub mod condor;
/// Look for output files with shell globbing
pub mod output;
/// Classify every job of one or more sessions
pub mod report;

pub use report::{classify, scan_session, scan_sessions, JobStatus, ScanReport, SessionScan};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("can't read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no {what} found in {source_name}")]
    PatternNotFound {
        what: &'static str,
        source_name: String,
    },
    #[error("found no mention of evictions or terminations in log: {}", .0.display())]
    NoTerminalEvent(PathBuf),
    #[error("could not determine if job was evicted: {}", .0.display())]
    AmbiguousEvents(PathBuf),
}
