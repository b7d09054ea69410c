//! Build STAR scheduler job requests and find jobs that need resubmitting
//!
//! The job side turns a sectioned TOML configuration into a `<job>` XML document that
//! `star-submit` accepts. The scan side reads scheduler session files and condor logs to find
//! jobs that were evicted or never wrote their output.

/// Job descriptors, configuration loading and XML rendering
pub mod job;
/// Scan session files and condor logs for evicted or incomplete jobs
pub mod scan;
/// Run the external `star-submit` tool
pub mod submit;
