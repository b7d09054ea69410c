use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, info};
use regex::{Captures, Regex};
use serde::Deserialize;
use toml::{Table, Value};

use crate::job::descriptor::{InputFile, Job, OutputFile, SandboxInstaller};
use crate::job::JobError;

/// Section holding fallback values for `%(name)s` references
static DEFAULT_SECTION: &str = "DEFAULT";
/// References nested deeper than this are treated as a loop
static MAX_INTERPOLATION_DEPTH: usize = 10;

/// `%%` escapes a literal `%`, `%(name)s` refers to another key
static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%|%\((\w+)\)s").expect("reference pattern compiles"));

/// A job configuration file, after interpolation
///
/// All five job sections must be present. Keys inside a section may be left out.
#[derive(Debug, Deserialize)]
struct JobConfig {
    job_attributes: Table,
    generator: GeneratorSection,
    sandbox: SandboxSection,
    input: InputSection,
    output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratorSection {
    location: String,
    report_location: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SandboxSection {
    files: String,
    package_name: String,
    installer_option: Option<SandboxInstaller>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InputSection {
    commands: String,
    files: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputSection {
    paths: String,
    stderr_path: String,
}

impl Job {
    /// Create a job from the defaults and a configuration file
    pub fn from_config(path: &Path) -> Result<Job, JobError> {
        let mut job = Job::default();
        job.load_from_config(path)?;
        Ok(job)
    }

    /// Populate this job from a configuration file
    ///
    /// Attributes are merged, lists are appended to and single values replaced. Nothing is
    /// changed if the file can't be read or parsed.
    pub fn load_from_config(&mut self, path: &Path) -> Result<(), JobError> {
        info!("Reading job configuration {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from_str(&text)
    }

    /// Populate this job from configuration text, see [`Job::load_from_config`]
    pub fn load_from_str(&mut self, text: &str) -> Result<(), JobError> {
        let mut table: Table = toml::from_str(text)?;
        interpolate(&mut table)?;
        let config: JobConfig = Value::Table(table).try_into()?;

        // parse every list before touching the job
        let sandbox_files: Vec<&str> = split_list(&config.sandbox.files).collect();
        let commands: Vec<&str> = split_list(&config.input.commands).collect();
        let input_files = split_list(&config.input.files)
            .map(|entry| -> Result<InputFile, JobError> {
                let (url, count) = split_pair(entry, "input", "files")?;
                let file_count = count
                    .parse::<u32>()
                    .map_err(|_| JobError::FileCount(count.to_string()))?;
                Ok(InputFile::new(url, file_count))
            })
            .collect::<Result<Vec<InputFile>, JobError>>()?;
        let output_files = split_list(&config.output.paths)
            .map(|entry| -> Result<OutputFile, JobError> {
                let (to_url, from_scratch) = split_pair(entry, "output", "paths")?;
                Ok(OutputFile::new(to_url, from_scratch))
            })
            .collect::<Result<Vec<OutputFile>, JobError>>()?;

        for (key, value) in &config.job_attributes {
            self.add_attribute(key.as_str(), value_text(value));
        }
        self.generator_location = config.generator.location;
        self.generator_report_location = config.generator.report_location;
        if let Some(installer) = config.sandbox.installer_option {
            self.sandbox_installer_option = installer;
        }
        self.sandbox_package_name = config.sandbox.package_name;
        self.stderr_path = config.output.stderr_path;

        debug!(
            "Loaded {} command(s), {} sandbox file(s), {} input(s), {} output(s)",
            commands.len(),
            sandbox_files.len(),
            input_files.len(),
            output_files.len()
        );
        self.add_commands(commands);
        self.add_sandbox_files(sandbox_files);
        self.add_input_files(input_files);
        self.add_output_files(output_files);

        Ok(())
    }
}

/// Split a `;` separated list, dropping empty entries
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(';').map(str::trim).filter(|entry| !entry.is_empty())
}

/// Split a `first,second` entry into exactly two trimmed tokens
fn split_pair<'a>(entry: &'a str, section: &str, key: &str) -> Result<(&'a str, &'a str), JobError> {
    let tokens: Vec<&str> = entry.split(',').map(str::trim).collect();
    match tokens.as_slice() {
        [first, second] => Ok((*first, *second)),
        _ => Err(JobError::MalformedPair {
            section: section.to_string(),
            key: key.to_string(),
            entry: entry.to_string(),
        }),
    }
}

/// Plain text of a config value: strings unquoted, everything else in its TOML form
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Expand `%(name)s` references in every string value
///
/// Names are looked up in the value's own section first, then in `[DEFAULT]`.
fn interpolate(table: &mut Table) -> Result<(), JobError> {
    let defaults = match table.get(DEFAULT_SECTION) {
        Some(Value::Table(defaults)) => defaults.clone(),
        _ => Table::new(),
    };

    for (name, section) in table.iter_mut() {
        let Value::Table(section) = section else { continue };
        let raw = section.clone();
        for (key, value) in section.iter_mut() {
            if let Value::String(text) = value {
                *text = expand(text, |reference| {
                    raw.get(reference)
                        .or_else(|| defaults.get(reference))
                        .map(value_text)
                })
                .map_err(|reference| JobError::Interpolation {
                    section: name.clone(),
                    key: key.clone(),
                    reference,
                })?;
            }
        }
    }

    Ok(())
}

/// First `%(name)s` reference in `text`, skipping `%%` escapes
fn first_reference(text: &str) -> Option<String> {
    REFERENCE
        .captures_iter(text)
        .find_map(|caps| caps.get(1).map(|name| name.as_str().to_string()))
}

/// Repeatedly replace references until none are left, or return the name that can't be resolved
///
/// `%%` survives every pass and becomes `%` once all references are expanded.
fn expand(text: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String, String> {
    let mut current = text.to_string();

    for _ in 0..MAX_INTERPOLATION_DEPTH {
        if first_reference(&current).is_none() {
            return Ok(current.replace("%%", "%"));
        }

        let mut missing: Option<String> = None;
        let next = REFERENCE.replace_all(&current, |caps: &Captures| match caps.get(1) {
            None => "%%".to_string(),
            Some(name) => lookup(name.as_str()).unwrap_or_else(|| {
                missing.get_or_insert_with(|| name.as_str().to_string());
                String::new()
            }),
        });
        if let Some(reference) = missing {
            return Err(reference);
        }
        current = next.into_owned();
    }

    match first_reference(&current) {
        Some(reference) => Err(reference),
        None => Ok(current.replace("%%", "%")),
    }
}
