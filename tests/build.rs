use std::fs;
use std::path::Path;

use starjob::job::{InputFile, Job, JobError, OutputFile, SubmissionDocument};

fn write_config(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("job.toml");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn one_of_everything() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[job_attributes]

[generator]
location = "./report/"

[sandbox]
files = "file:./flow.C"

[input]
commands = "root4star -b -q flow.C"
files = "http://x,3"

[output]
paths = "file:/star/out/,*.root"
stderr_path = "file:/star/log/job.err"
"#,
    );

    let job = Job::from_config(&config).unwrap();
    let document = SubmissionDocument::from(&job);

    let attributes: Vec<(&str, &str)> = document
        .attributes
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(attributes, vec![("fileListSyntax", "xrootd"), ("simulateSubmission", "true")]);
    assert_eq!(document.commands, vec!["root4star -b -q flow.C"]);
    assert_eq!(document.sandbox.files, vec!["file:./flow.C"]);
    assert_eq!(document.inputs.len(), 1);
    assert_eq!(document.inputs[0].url, "http://x");
    assert_eq!(document.inputs[0].file_count, "3");
    assert_eq!(document.outputs.len(), 1);
    assert_eq!(document.outputs[0].to_url, "file:/star/out/");
    assert_eq!(document.outputs[0].from_scratch, "*.root");
    assert_eq!(document.stderr, "file:/star/log/job.err");

    let xml = document.render().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n"));
    assert!(xml.contains("<job fileListSyntax=\"xrootd\" simulateSubmission=\"true\">"));
    assert!(xml.contains("    <command>\n        root4star -b -q flow.C\n    </command>\n"));
    assert!(xml.contains("<input URL=\"http://x\" nFiles=\"3\" />"));
    assert!(xml.contains("<output fromScratch=\"*.root\" toURL=\"file:/star/out/\" />"));
    assert!(xml.contains("<stdout discard=\"true\" />"));
    assert!(xml.contains("<stderr URL=\"file:/star/log/job.err\" />"));
    assert_eq!(xml, job.to_xml().unwrap());
}

#[test]
fn example_configuration_loads() {
    let example = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/example.toml");
    let job = Job::from_config(&example).unwrap();

    assert_eq!(job.attributes["name"], "pion_flow");
    assert_eq!(job.generator_location, "/star/u/analyst/pion_flow/report");
    assert_eq!(job.input_files, vec![InputFile::new("catalog:star.bnl.gov?production=P16id", 100)]);
    assert_eq!(
        job.output_files,
        vec![OutputFile::new("file:/star/u/analyst/pion_flow/out/", "*.root")]
    );
    assert!(job.to_xml().is_ok());
}

#[test]
fn config_and_code_additions_combine() {
    let example = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/example.toml");
    let mut job = Job::default();
    job.load_from_config(&example).unwrap();
    job.add_command("echo done");
    job.add_output_files([OutputFile::new("file:/star/hist/", "*.hist.root")]);

    let document = SubmissionDocument::from(&job);
    assert_eq!(document.commands, vec!["root4star -b -q flow.C", "echo done"]);
    assert_eq!(document.outputs.len(), 2);
    assert_eq!(document.outputs[1].from_scratch, "*.hist.root");
}

#[test]
fn malformed_config_is_not_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[job_attributes]\nname = \n");
    assert!(matches!(Job::from_config(&config), Err(JobError::Config(_))));
}
