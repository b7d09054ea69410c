use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use starjob::scan::{scan_session, scan_sessions, ScanError};
use starjob::submit::SubmitTool;

const FIRST: &str = "0123456789ABCDEF0123456789ABCDEF";
const SECOND: &str = "FEDCBA9876543210FEDCBA9876543210";

const TERMINATED: &str = "005 (4321.000.000) 07/01 12:00:00 Job terminated.";
const ABORTED: &str = "009 (4321.000.000) 07/01 13:00:00 Job was aborted by the user.";

/// Write a session file for `job_count` jobs, with logs in `<dir>/log` and output in `<dir>/out`
fn write_session(dir: &Path, id: &str, job_count: u32) -> PathBuf {
    let mut xml = String::from("<java version=\"1.8\" class=\"java.beans.XMLDecoder\">\n");
    xml.push_str(&format!(
        "  <void property=\"listLocation\">\n   <string>{}/log</string>\n  </void>\n",
        dir.display()
    ));
    for index in 1..job_count {
        xml.push_str(&format!("  <void property=\"jobIndex\">\n   <int>{index}</int>\n  </void>\n"));
    }
    xml.push_str(&format!(
        concat!(
            "  <void property=\"fromScratch\">\n",
            "   <string>*.root</string>\n",
            "  </void>\n",
            "  <void property=\"toURLString\">\n",
            "   <string>file:{}/out/</string>\n",
            "  </void>\n",
            "</java>\n",
        ),
        dir.display()
    ));

    fs::create_dir_all(dir.join("log")).unwrap();
    fs::create_dir_all(dir.join("out")).unwrap();
    let path = dir.join(format!("{id}.session.xml"));
    fs::write(&path, xml).unwrap();
    path
}

fn write_log(dir: &Path, id: &str, index: u32, lines: &[&str]) {
    let path = dir.join("log").join(format!("sched{id}_{index}.condor.log"));
    let mut text = vec!["000 (4321.000.000) 07/01 10:00:00 Job submitted from host"];
    text.extend_from_slice(lines);
    fs::write(path, text.join("\n")).unwrap();
}

fn write_output(dir: &Path, id: &str, index: u32) {
    fs::write(dir.join("out").join(format!("pion_flow_{id}_{index}.picoDst.root")), "").unwrap();
}

#[test]
fn flags_evicted_and_missing_output() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), FIRST, 4);

    write_log(dir.path(), FIRST, 0, &[TERMINATED]);
    write_output(dir.path(), FIRST, 0);
    write_log(dir.path(), FIRST, 1, &[TERMINATED, ABORTED]);
    write_output(dir.path(), FIRST, 1);
    write_log(dir.path(), FIRST, 2, &[TERMINATED]);
    write_log(dir.path(), FIRST, 3, &[ABORTED, TERMINATED]);
    write_output(dir.path(), FIRST, 3);

    let scan = scan_session(&session).unwrap();
    assert_eq!(scan.session_id, FIRST);
    assert_eq!(scan.job_count, 4);
    assert_eq!(scan.failed, vec![1, 2]);
    assert_eq!(
        scan.to_string(),
        format!("Session {FIRST} found 2 job(s) for resubmission: [1, 2]")
    );
}

#[test]
fn totals_across_sessions() {
    let first_dir = tempfile::tempdir().unwrap();
    let first = write_session(first_dir.path(), FIRST, 2);
    write_log(first_dir.path(), FIRST, 0, &[ABORTED]);
    write_log(first_dir.path(), FIRST, 1, &[TERMINATED]);

    let second_dir = tempfile::tempdir().unwrap();
    let second = write_session(second_dir.path(), SECOND, 1);
    write_log(second_dir.path(), SECOND, 0, &[TERMINATED]);
    write_output(second_dir.path(), SECOND, 0);

    let report = scan_sessions(&[first.clone(), second]).unwrap();
    assert_eq!(report.failed_total, 2);
    assert_eq!(report.sessions.len(), 2);
    assert_eq!(report.sessions[0].failed, vec![0, 1]);
    assert!(report.sessions[1].failed.is_empty());

    let to_resubmit: Vec<&Path> = report.to_resubmit().map(|s| s.session_file.as_path()).collect();
    assert_eq!(to_resubmit, vec![first.as_path()]);
}

#[test]
fn log_without_terminal_event_stops_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), FIRST, 1);
    write_log(dir.path(), FIRST, 0, &["001 (4321.000.000) 07/01 11:00:00 Job executing on host"]);

    assert!(matches!(scan_session(&session), Err(ScanError::NoTerminalEvent(_))));
}

#[test]
fn missing_log_stops_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), FIRST, 2);
    write_log(dir.path(), FIRST, 0, &[TERMINATED]);
    write_output(dir.path(), FIRST, 0);

    assert!(matches!(scan_session(&session), Err(ScanError::Read { .. })));
}

#[test]
fn evicted_jobs_need_no_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), FIRST, 2);
    let text = fs::read_to_string(&session).unwrap();
    fs::write(&session, text.replace("<string>*.root</string>", "<string>*.picoDst.root</string>")).unwrap();
    write_log(dir.path(), FIRST, 0, &[ABORTED]);
    write_log(dir.path(), FIRST, 1, &[TERMINATED, ABORTED]);

    let scan = scan_session(&session).unwrap();
    assert_eq!(scan.failed, vec![0, 1]);
    assert_eq!(
        scan.to_string(),
        format!("Session {FIRST} found 2 job(s) for resubmission: [0, 1]")
    );
}

#[test]
fn finished_job_needs_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), FIRST, 2);
    let text = fs::read_to_string(&session).unwrap();
    fs::write(&session, text.replace("<string>*.root</string>", "<string>*.picoDst.root</string>")).unwrap();
    write_log(dir.path(), FIRST, 0, &[ABORTED]);
    write_log(dir.path(), FIRST, 1, &[TERMINATED]);

    assert!(matches!(scan_session(&session), Err(ScanError::PatternNotFound { .. })));
}

#[test]
fn session_file_without_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), "not-a-session", 1);
    assert!(matches!(scan_session(&session), Err(ScanError::PatternNotFound { .. })));
}

#[test]
fn resubmits_failed_indices() {
    let dir = tempfile::tempdir().unwrap();
    let session = write_session(dir.path(), FIRST, 3);
    write_log(dir.path(), FIRST, 0, &[TERMINATED]);
    write_output(dir.path(), FIRST, 0);
    write_log(dir.path(), FIRST, 1, &[ABORTED]);
    write_log(dir.path(), FIRST, 2, &[TERMINATED]);

    let tool_path = dir.path().join("fake-submit");
    fs::write(&tool_path, "#!/bin/sh\necho \"$@\"\n").unwrap();
    fs::set_permissions(&tool_path, fs::Permissions::from_mode(0o755)).unwrap();

    let report = scan_sessions(&[session.clone()]).unwrap();
    let scan = report.to_resubmit().next().unwrap();
    let outcome = SubmitTool::new(tool_path).resubmit(&scan.session_file, &scan.failed).unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.stdout, format!("-r 1,2 {}\n", session.display()));
}
