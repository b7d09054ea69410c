use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{info, warn};
use thiserror::Error;

/// Program used when no other submission tool is configured
pub static STAR_SUBMIT: &str = "star-submit";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("can't run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
}

/// The result of one run of the submission tool
///
/// A non-zero exit is not an error here: callers decide what a failed submission means.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl SubmitOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs `star-submit` (or a stand-in) to submit job requests and resubmit failed jobs
#[derive(Clone, Debug)]
pub struct SubmitTool {
    program: PathBuf,
}

impl Default for SubmitTool {
    fn default() -> Self {
        SubmitTool::new(STAR_SUBMIT)
    }
}

impl SubmitTool {
    pub fn new(program: impl Into<PathBuf>) -> SubmitTool {
        SubmitTool { program: program.into() }
    }

    /// Submit a written job request: `star-submit <request>`
    pub fn submit(&self, request: &Path) -> Result<SubmitOutcome, SubmitError> {
        info!("Submitting job request {}", request.display());
        self.run(vec![request.as_os_str().to_owned()])
    }

    /// Resubmit jobs of a session: `star-submit -r <i,j,...> <session file>`
    pub fn resubmit(&self, session_file: &Path, job_indices: &[u32]) -> Result<SubmitOutcome, SubmitError> {
        let indices = job_index_list(job_indices);
        info!("Resubmitting jobs {indices} of session {}", session_file.display());
        self.run(vec![
            OsString::from("-r"),
            OsString::from(indices),
            session_file.as_os_str().to_owned(),
        ])
    }

    fn run(&self, arguments: Vec<OsString>) -> Result<SubmitOutcome, SubmitError> {
        let mut command = Command::new(&self.program);
        let cmd = command.args(&arguments);
        info!("Running {} process", self.program.display());
        info!("{:?}", &cmd);

        let output = cmd.output().map_err(|source| SubmitError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let outcome = SubmitOutcome {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !outcome.success() {
            warn!("{} exited with {}: {}", self.program.display(), outcome.status, outcome.stderr.trim());
        }

        Ok(outcome)
    }
}

/// Comma separated job indices, as `star-submit -r` expects them
pub fn job_index_list(job_indices: &[u32]) -> String {
    job_indices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<String>>()
        .join(",")
}
