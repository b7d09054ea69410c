use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::job::JobError;

/// Every field name a job can be created with
pub const FIELDS: [&str; 10] = [
    "attributes",
    "commands",
    "generator_location",
    "generator_report_location",
    "sandbox_installer_option",
    "sandbox_package_name",
    "sandbox_files",
    "input_files",
    "output_files",
    "stderr_path",
];

/// How the scheduler packages the sandbox before shipping it with the job
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SandboxInstaller {
    #[default]
    Zip,
    Tgz,
}

impl fmt::Display for SandboxInstaller {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SandboxInstaller::Zip => write!(f, "ZIP"),
            SandboxInstaller::Tgz => write!(f, "TGZ"),
        }
    }
}

/// A catalog query or file URL, and how many files the scheduler should take from it
///
/// Deserialises from a map or a two element sequence, e.g. `["catalog:star.bnl.gov", 100]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InputFile {
    pub url: String,
    pub file_count: u32,
}

impl InputFile {
    pub fn new(url: impl Into<String>, file_count: u32) -> InputFile {
        InputFile { url: url.into(), file_count }
    }
}

/// Where to copy files matching `from_scratch` once the job finishes
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OutputFile {
    pub to_url: String,
    pub from_scratch: String,
}

impl OutputFile {
    pub fn new(to_url: impl Into<String>, from_scratch: impl Into<String>) -> OutputFile {
        OutputFile { to_url: to_url.into(), from_scratch: from_scratch.into() }
    }
}

/// Optional replacements for the defaults of a [`Job`]
///
/// Unknown field names are rejected when deserialising.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobOverrides {
    pub attributes: Option<BTreeMap<String, String>>,
    pub commands: Option<Vec<String>>,
    pub generator_location: Option<String>,
    pub generator_report_location: Option<String>,
    pub sandbox_installer_option: Option<SandboxInstaller>,
    pub sandbox_package_name: Option<String>,
    pub sandbox_files: Option<Vec<String>>,
    pub input_files: Option<Vec<InputFile>>,
    pub output_files: Option<Vec<OutputFile>>,
    pub stderr_path: Option<String>,
}

/// Everything that appears inside one `<job>...</job>` element of a request
///
/// Lists keep insertion order, and every field has an empty default so a job can always be
/// rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    pub attributes: BTreeMap<String, String>,
    pub commands: Vec<String>,
    pub generator_location: String,
    pub generator_report_location: String,
    pub sandbox_installer_option: SandboxInstaller,
    pub sandbox_package_name: String,
    pub sandbox_files: Vec<String>,
    pub input_files: Vec<InputFile>,
    pub output_files: Vec<OutputFile>,
    pub stderr_path: String,
}

impl Default for Job {
    fn default() -> Self {
        let attributes = BTreeMap::from([
            ("simulateSubmission".to_string(), true.to_string()),
            ("fileListSyntax".to_string(), "xrootd".to_string()),
        ]);

        Job {
            attributes,
            commands: Vec::new(),
            generator_location: String::new(),
            generator_report_location: String::new(),
            sandbox_installer_option: SandboxInstaller::default(),
            sandbox_package_name: String::new(),
            sandbox_files: Vec::new(),
            input_files: Vec::new(),
            output_files: Vec::new(),
            stderr_path: String::new(),
        }
    }
}

impl Job {
    /// Start from the defaults and apply every override that is set
    ///
    /// Attribute overrides are merged into the default attributes, all other fields replace
    /// their default.
    pub fn create(overrides: JobOverrides) -> Job {
        let mut job = Job::default();

        if let Some(attributes) = overrides.attributes {
            job.attributes.extend(attributes);
        }
        if let Some(commands) = overrides.commands {
            job.commands = commands;
        }
        if let Some(location) = overrides.generator_location {
            job.generator_location = location;
        }
        if let Some(location) = overrides.generator_report_location {
            job.generator_report_location = location;
        }
        if let Some(installer) = overrides.sandbox_installer_option {
            job.sandbox_installer_option = installer;
        }
        if let Some(name) = overrides.sandbox_package_name {
            job.sandbox_package_name = name;
        }
        if let Some(files) = overrides.sandbox_files {
            job.sandbox_files = files;
        }
        if let Some(files) = overrides.input_files {
            job.input_files = files;
        }
        if let Some(files) = overrides.output_files {
            job.output_files = files;
        }
        if let Some(path) = overrides.stderr_path {
            job.stderr_path = path;
        }

        job
    }

    /// Create a job from loosely typed, named overrides (e.g. parsed from JSON)
    ///
    /// Every unknown name is reported at once, before any value is checked.
    pub fn from_overrides(overrides: Map<String, Value>) -> Result<Job, JobError> {
        let mut unknown: Vec<String> = overrides
            .keys()
            .filter(|key| !FIELDS.contains(&key.as_str()))
            .cloned()
            .collect();

        if !unknown.is_empty() {
            unknown.sort();
            return Err(JobError::UnknownFields(unknown));
        }

        let overrides: JobOverrides = serde_json::from_value(Value::Object(overrides))?;
        Ok(Job::create(overrides))
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        debug!("Setting job attribute {key}={value}");
        self.attributes.insert(key, value);
    }

    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    pub fn add_commands<I, S>(&mut self, commands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
    }

    pub fn add_sandbox_files<I, S>(&mut self, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sandbox_files.extend(files.into_iter().map(Into::into));
    }

    pub fn add_input_files(&mut self, files: impl IntoIterator<Item = InputFile>) {
        self.input_files.extend(files);
    }

    pub fn add_output_files(&mut self, files: impl IntoIterator<Item = OutputFile>) {
        self.output_files.extend(files);
    }
}
