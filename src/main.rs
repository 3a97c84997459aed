use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use loopquest::{RunConfig, RunResult, translator, validator};

#[derive(Parser)]
#[command(name = "loopquest")]
#[command(about = "Validate, translate and run loop exercises", long_about = None)]
struct Cli {
    /// Program to run (reads stdin when omitted)
    path: Option<PathBuf>,

    /// Only run the syntax validator
    #[arg(long)]
    check: bool,

    /// Print the translated statement tree instead of running it
    #[arg(long, conflicts_with = "check")]
    tree: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Compare the output with the lines of this file
    #[arg(long, value_name = "FILE")]
    expect: Option<PathBuf>,

    /// Maximum statements and loop iterations per run
    #[arg(long, env = "LOOPQUEST_STEP_LIMIT")]
    step_limit: Option<u64>,

    /// Maximum length of a single range() call
    #[arg(long, env = "LOOPQUEST_RANGE_LIMIT")]
    range_limit: Option<usize>,

    /// Maximum length of a string or list built by `+` or `*`
    #[arg(long, env = "LOOPQUEST_SEQUENCE_LIMIT")]
    sequence_limit: Option<usize>,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            step_limit: self.step_limit,
            range_limit: self.range_limit,
            sequence_limit: self.sequence_limit,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    let source = read_source(cli.path.as_deref())?;

    if cli.check {
        return Ok(match validator::validate(&source) {
            Ok(()) => {
                println!("OK");
                ExitCode::SUCCESS
            }
            Err(defect) => report_error(&defect.to_string()),
        });
    }

    if cli.tree {
        let translation = validator::validate(&source)
            .map_err(loopquest::Error::from)
            .and_then(|()| translator::translate(&source).map_err(loopquest::Error::from));
        return Ok(match translation {
            Ok(translation) => {
                println!("{:#?}", translation.program);
                ExitCode::SUCCESS
            }
            Err(error) => report_failure(&source, &error),
        });
    }

    let outcome = loopquest::execute(&source, &cli.run_config());
    let failure = outcome.as_ref().err().cloned();
    let result = RunResult::from(outcome);

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Serialising result")?;
        println!("{json}");
    } else {
        for line in &result.output {
            println!("{line}");
        }
    }

    if let Some(error) = &failure {
        return Ok(report_failure(&source, error));
    }

    if let Some(expect_path) = &cli.expect {
        return compare_with_expected(&result, expect_path);
    }

    Ok(ExitCode::SUCCESS)
}

fn read_source(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        return fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()));
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Reading stdin")?;
    Ok(buffer)
}

fn report_error(message: &str) -> ExitCode {
    eprintln!("Error: {message}");
    ExitCode::FAILURE
}

/// Reports `error` and, for parse errors, points at the offending column.
fn report_failure(source: &str, error: &loopquest::Error) -> ExitCode {
    let code = report_error(&error.to_string());
    if let (Some(line), Some(column)) = (error.line(), error.column())
        && let Some(text) = source.split('\n').nth(line.saturating_sub(1))
    {
        eprintln!("    {}", text.trim());
        eprintln!("    {}^", " ".repeat(column));
    }
    code
}

fn compare_with_expected(result: &RunResult, expect_path: &Path) -> Result<ExitCode> {
    let expected = fs::read_to_string(expect_path)
        .with_context(|| format!("Reading {}", expect_path.display()))?;
    let expected_lines = expected.lines().collect::<Vec<_>>();
    if result.matches(&expected_lines) {
        eprintln!("Output matches {}", expect_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!(
        "Output does not match {} (expected {} lines, got {})",
        expect_path.display(),
        expected_lines.len(),
        result.output.len()
    );
    for (index, (actual, expected)) in result.output.iter().zip(&expected_lines).enumerate() {
        if actual != expected {
            eprintln!("  line {}: expected {expected:?}, got {actual:?}", index + 1);
        }
    }
    Ok(ExitCode::FAILURE)
}
