use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::Value;
use tinytemplate::TinyTemplate;

use crate::job::descriptor::Job;
use crate::job::JobError;

/// A `<job>` request ready to be rendered for `star-submit`
///
/// Section order is fixed by the template: command, Generator, SandBox, inputs, outputs,
/// stdout and stderr. Every list keeps the order of the job it was built from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionDocument {
    pub attributes: Vec<Attribute>,
    pub commands: Vec<String>,
    pub generator: Generator,
    pub sandbox: Sandbox,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub stdout_discard: bool,
    pub stderr: String,
}

/// A property of the root `<job>` element
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Generator {
    pub location: String,
    pub report_location: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sandbox {
    pub installer: String,
    pub package_name: String,
    pub files: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Input {
    pub url: String,
    pub file_count: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Output {
    pub to_url: String,
    pub from_scratch: String,
}

impl From<&Job> for SubmissionDocument {
    fn from(job: &Job) -> Self {
        SubmissionDocument {
            attributes: job
                .attributes
                .iter()
                .map(|(name, value)| Attribute { name: name.clone(), value: value.clone() })
                .collect(),
            commands: job.commands.clone(),
            generator: Generator {
                location: job.generator_location.clone(),
                report_location: job.generator_report_location.clone(),
            },
            sandbox: Sandbox {
                installer: job.sandbox_installer_option.to_string(),
                package_name: job.sandbox_package_name.clone(),
                files: job.sandbox_files.clone(),
            },
            inputs: job
                .input_files
                .iter()
                .map(|file| Input { url: file.url.clone(), file_count: file.file_count.to_string() })
                .collect(),
            outputs: job
                .output_files
                .iter()
                .map(|file| Output { to_url: file.to_url.clone(), from_scratch: file.from_scratch.clone() })
                .collect(),
            stdout_discard: true,
            stderr: job.stderr_path.clone(),
        }
    }
}

impl SubmissionDocument {
    /// Render the document as indented, UTF-8 declared XML
    pub fn render(&self) -> Result<String, JobError> {
        /// included job request template
        static JOB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/job.xml"));
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_xml);
        tt.add_template("job", JOB)?;

        Ok(tt.render("job", self)?)
    }

    /// Render the document and write it to disk, replacing any existing file
    pub fn write(&self, out_path: &Path) -> Result<(), JobError> {
        let xml = self.render()?;
        info!("Writing job request to {}", out_path.display());
        fs::write(out_path, xml).map_err(|source| JobError::Write {
            path: out_path.to_path_buf(),
            source,
        })
    }
}

impl Job {
    /// Build a fresh document from this job and render it
    pub fn to_xml(&self) -> Result<String, JobError> {
        SubmissionDocument::from(self).render()
    }
}

/// Template value formatter that escapes strings for XML text and attribute values
fn format_xml(value: &Value, output: &mut String) -> Result<(), tinytemplate::error::Error> {
    match value {
        Value::String(text) => {
            escape_xml(text, output);
            Ok(())
        }
        other => tinytemplate::format_unescaped(other, output),
    }
}

fn escape_xml(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            _ => output.push(c),
        }
    }
}
