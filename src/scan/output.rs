use std::process::{Command, Stdio};

use log::{debug, warn};

/// Whether any `<directory>*<job id>*.root` file exists
///
/// The glob is expanded by `sh` and checked with `ls`, so any failure to run the shell counts as
/// missing output.
pub fn has_output(directory: &str, job_id: &str) -> bool {
    let glob = format!("{directory}*{job_id}*.root");
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("ls {glob}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) => {
            debug!("ls {glob}: {status}");
            status.success()
        }
        Err(err) => {
            warn!("Can't list {glob}: {err}");
            false
        }
    }
}
