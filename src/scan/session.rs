use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use crate::scan::ScanError;

// session files are java beans XML, each property value on the line after its <void> tag
static JOB_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<void property="jobIndex">\n\s*<int>(\d+)</int>"#).expect("job index pattern compiles")
});
static LIST_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<void property="listLocation">\n\s*<string>(.*)</string>"#).expect("list location pattern compiles")
});
static ROOT_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"<void property="fromScratch">\n"#,
        r#"\s*<string>\*\.root</string>\n"#,
        r#"\s*</void>\n"#,
        r#"\s*<void property="toURLString">\n"#,
        r#"\s*<string>file:(.*)</string>"#,
    ))
    .expect("output location pattern compiles")
});
static SESSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-F]{32}").expect("session id pattern compiles"));

/// A session file written by `star-submit`, read once
#[derive(Debug)]
pub struct SessionFile {
    pub path: PathBuf,
    text: String,
}

impl SessionFile {
    pub fn open(path: &Path) -> Result<SessionFile, ScanError> {
        info!("Reading session file {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SessionFile { path: path.to_path_buf(), text })
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> SessionFile {
        SessionFile { path: path.into(), text: text.into() }
    }

    /// Number of jobs in the session
    ///
    /// Job index 0 is never written to the session file, so it's added to the matched indices.
    pub fn job_count(&self) -> u32 {
        let declared = JOB_INDEX.find_iter(&self.text).count() as u32;
        debug!("{} declares {declared} job index(es) after 0", self.path.display());
        declared + 1
    }

    /// Directory holding the `*.condor.log` files of the session
    pub fn log_directory(&self) -> Result<String, ScanError> {
        self.capture(&LIST_LOCATION, "log directory")
    }

    /// Local directory the `*.root` output of the session is copied to
    pub fn output_directory(&self) -> Result<String, ScanError> {
        self.capture(&ROOT_OUTPUT, "*.root output directory")
    }

    /// Session id taken from the file name, e.g. `0A1B...F9.session.xml`
    pub fn session_id(&self) -> Result<String, ScanError> {
        let name = match self.path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.path.to_string_lossy(),
        };
        session_id(&name)
    }

    fn capture(&self, pattern: &Regex, what: &'static str) -> Result<String, ScanError> {
        pattern
            .captures(&self.text)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ScanError::PatternNotFound {
                what,
                source_name: self.path.display().to_string(),
            })
    }
}

pub fn job_count(session_file: &Path) -> Result<u32, ScanError> {
    Ok(SessionFile::open(session_file)?.job_count())
}

pub fn log_directory(session_file: &Path) -> Result<String, ScanError> {
    SessionFile::open(session_file)?.log_directory()
}

pub fn output_directory(session_file: &Path) -> Result<String, ScanError> {
    SessionFile::open(session_file)?.output_directory()
}

/// First 32 character upper case hex session id in `text`
pub fn session_id(text: &str) -> Result<String, ScanError> {
    SESSION_ID
        .find(text)
        .map(|found| found.as_str().to_string())
        .ok_or_else(|| ScanError::PatternNotFound {
            what: "session id",
            source_name: text.to_string(),
        })
}

/// Condor log of one job: `<directory>/sched<session id>_<index>.condor.log`
pub fn log_path(directory: &str, session_id: &str, job_index: u32) -> PathBuf {
    PathBuf::from(format!("{directory}/sched{session_id}_{job_index}.condor.log"))
}

/// Id that appears in the output file names of one job
pub fn job_id(session_id: &str, job_index: u32) -> String {
    format!("{session_id}_{job_index}")
}
