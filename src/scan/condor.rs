use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use log::debug;

use crate::scan::ScanError;

static ABORT_MARKER: &str = "Job was aborted by the user";
static TERMINATE_MARKER: &str = "Job terminated";

/// Whether the job behind a condor log was evicted
///
/// Compares the last line that mentions an abort with the last line that mentions a
/// termination: whichever comes later wins. A line with the abort marker is not checked for
/// the termination marker.
pub fn was_evicted(log_file: &Path) -> Result<bool, ScanError> {
    let text = fs::read_to_string(log_file).map_err(|source| ScanError::Read {
        path: log_file.to_path_buf(),
        source,
    })?;

    let mut aborted: Option<usize> = None;
    let mut terminated: Option<usize> = None;
    for (index, line) in text.lines().enumerate() {
        if line.contains(ABORT_MARKER) {
            aborted = Some(index);
        } else if line.contains(TERMINATE_MARKER) {
            terminated = Some(index);
        }
    }
    debug!("{}: last abort {aborted:?}, last termination {terminated:?}", log_file.display());

    if aborted.is_none() && terminated.is_none() {
        return Err(ScanError::NoTerminalEvent(log_file.to_path_buf()));
    }

    // None sorts before any line, so a missing marker always loses
    match terminated.cmp(&aborted) {
        Ordering::Greater => Ok(false),
        Ordering::Less => Ok(true),
        Ordering::Equal => Err(ScanError::AmbiguousEvents(log_file.to_path_buf())),
    }
}
