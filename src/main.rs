use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use starjob::job::{Job, SubmissionDocument};
use starjob::scan::scan_sessions;
use starjob::submit::{SubmitTool, STAR_SUBMIT};

#[derive(Parser, Debug)]
#[command(name = "starjob")]
#[command(version)]
#[command(about = "Write STAR scheduler job requests and resubmit evicted jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a job request from a configuration file
    Build(BuildArgs),
    /// Scan session files for evicted or incomplete jobs
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Job configuration file (TOML)
    config: PathBuf,

    /// Write the job request here instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Submit the written job request (requires --output)
    #[arg(short, long, action)]
    submit: bool,

    /// Submission tool to run
    #[arg(long, default_value = STAR_SUBMIT)]
    star_submit: PathBuf,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Session files to scan
    #[arg(required = true)]
    sessions: Vec<PathBuf>,

    /// Do the resubmission (default off)
    #[arg(short, long, action)]
    resubmit: bool,

    /// Don't ask before resubmitting
    #[arg(short, long, action)]
    yes: bool,

    /// Submission tool to run
    #[arg(long, default_value = STAR_SUBMIT)]
    star_submit: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    match args.command {
        Commands::Build(args) => build(args),
        Commands::Scan(args) => scan(args),
    }
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    let job = Job::from_config(&args.config)
        .with_context(|| format!("Loading job configuration {}", args.config.display()))?;
    let document = SubmissionDocument::from(&job);

    let Some(out_path) = args.output else {
        print!("{}", document.render()?);
        if args.submit {
            warn!("--submit needs --output, not submitting the job request");
        }
        return Ok(());
    };

    document.write(&out_path)?;
    if args.submit {
        let outcome = SubmitTool::new(args.star_submit).submit(&out_path)?;
        print!("{}", outcome.stdout);
        if !outcome.success() {
            bail!("Submitting {} failed with {}", out_path.display(), outcome.status);
        }
        info!("Submitted {}", out_path.display());
    }

    Ok(())
}

fn scan(args: ScanArgs) -> anyhow::Result<()> {
    let report = scan_sessions(&args.sessions)?;
    for session in report.to_resubmit() {
        println!("{session}");
    }
    println!("Found {} failed jobs.", report.failed_total);

    if !args.resubmit {
        println!("Quitting without resubmitting. Invoke with -r if you want to resubmit.");
        return Ok(());
    }

    let question = "Are you sure you want to resubmit these jobs? (y/n): ";
    if !(args.yes || confirm(question, &mut io::stdin().lock(), &mut io::stdout())?) {
        println!("Quitting without resubmitting.");
        return Ok(());
    }

    let tool = SubmitTool::new(args.star_submit);
    let mut failures = 0;
    for session in report.to_resubmit() {
        match tool.resubmit(&session.session_file, &session.failed) {
            Ok(outcome) if outcome.success() => {
                print!("{}", outcome.stdout);
                info!("Resubmitted {} job(s) of session {}", session.failed.len(), session.session_id);
            }
            Ok(outcome) => {
                warn!("Resubmitting session {} failed with {}", session.session_id, outcome.status);
                failures += 1;
            }
            Err(err) => {
                warn!("Resubmitting session {} failed: {err}", session.session_id);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} session(s) could not be resubmitted");
    }
    Ok(())
}

/// Ask a yes/no question, only `y` and `yes` count as yes
fn confirm(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> anyhow::Result<bool> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "yes"))
}
