use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::scan::condor::was_evicted;
use crate::scan::output::has_output;
use crate::scan::session::{job_id, log_path, SessionFile};
use crate::scan::ScanError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    Evicted,
    MissingOutput,
}

impl JobStatus {
    pub fn needs_resubmission(&self) -> bool {
        !matches!(self, JobStatus::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Evicted => write!(f, "evicted"),
            JobStatus::MissingOutput => write!(f, "missing output"),
        }
    }
}

/// Classify one job from its condor log and output directory
///
/// The output directory is only looked up, and output only looked for, when the log doesn't
/// show an eviction.
pub fn classify<F>(log_file: &Path, job_id: &str, output_directory: F) -> Result<JobStatus, ScanError>
where
    F: FnOnce() -> Result<String, ScanError>,
{
    if was_evicted(log_file)? {
        return Ok(JobStatus::Evicted);
    }
    if has_output(&output_directory()?, job_id) {
        Ok(JobStatus::Completed)
    } else {
        Ok(JobStatus::MissingOutput)
    }
}

/// Jobs of one session that need to be resubmitted
#[derive(Debug, Clone, PartialEq)]
pub struct SessionScan {
    pub session_file: PathBuf,
    pub session_id: String,
    pub job_count: u32,
    /// ascending job indices
    pub failed: Vec<u32>,
}

impl fmt::Display for SessionScan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Session {} found {} job(s) for resubmission: {:?}",
            self.session_id,
            self.failed.len(),
            self.failed
        )
    }
}

/// Check every job of a session, in index order
pub fn scan_session(session_file: &Path) -> Result<SessionScan, ScanError> {
    let session = SessionFile::open(session_file)?;
    let session_id = session.session_id()?;
    let log_directory = session.log_directory()?;
    let job_count = session.job_count();
    info!("Session {session_id} has {job_count} job(s)");

    let mut failed: Vec<u32> = Vec::new();
    for job_index in 0..job_count {
        let log = log_path(&log_directory, &session_id, job_index);
        let status = classify(&log, &job_id(&session_id, job_index), || session.output_directory())?;
        debug!("Job {job_index} of {session_id}: {status}");
        if status.needs_resubmission() {
            failed.push(job_index);
        }
    }

    Ok(SessionScan { session_file: session_file.to_path_buf(), session_id, job_count, failed })
}

/// Results of scanning several sessions
#[derive(Debug, Default)]
pub struct ScanReport {
    pub sessions: Vec<SessionScan>,
    pub failed_total: usize,
}

impl ScanReport {
    /// Sessions with at least one job to resubmit
    pub fn to_resubmit(&self) -> impl Iterator<Item = &SessionScan> {
        self.sessions.iter().filter(|scan| !scan.failed.is_empty())
    }
}

/// Scan session files in order, stopping at the first file that can't be scanned
pub fn scan_sessions<P: AsRef<Path>>(session_files: &[P]) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();
    for session_file in session_files {
        let scan = scan_session(session_file.as_ref())?;
        report.failed_total += scan.failed.len();
        report.sessions.push(scan);
    }
    Ok(report)
}
