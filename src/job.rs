//! Describe, load and render a single STAR scheduler job
//!
//! A [`Job`] holds everything that appears inside one `<job>...</job>` element of a request
//! file. Jobs are built from defaults, optionally populated from a configuration file, and then
//! rendered once into a [`SubmissionDocument`].

use std::path::PathBuf;

use thiserror::Error;

/// The job record and its add operations
pub mod descriptor;
/// Populate a job from a sectioned TOML configuration file
pub mod config;
/// Render a job into the scheduler's XML format
pub mod document;

pub use descriptor::{InputFile, Job, JobOverrides, OutputFile, SandboxInstaller};
pub use document::SubmissionDocument;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("unexpected job fields: {0:?}")]
    UnknownFields(Vec<String>),
    #[error("job overrides have the wrong shape: {0}")]
    Overrides(#[from] serde_json::Error),
    #[error("can't read job configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid job configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("can't interpolate %({reference})s in [{section}] {key}")]
    Interpolation {
        section: String,
        key: String,
        reference: String,
    },
    #[error("[{section}] {key}: expected two comma separated values, got '{entry}'")]
    MalformedPair {
        section: String,
        key: String,
        entry: String,
    },
    #[error("invalid file count '{0}'")]
    FileCount(String),
    #[error("can't write job document {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("can't render job document: {0}")]
    Render(#[from] tinytemplate::error::Error),
}
