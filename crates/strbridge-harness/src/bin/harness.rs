//! CLI entrypoint for the strbridge conformance harness.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use strbridge_harness::capture::capture_conversion_fixture_set;
use strbridge_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, StreamKind, now_utc, validate_log_file,
};
use strbridge_harness::{FixtureSet, HarnessError, TestRunner, VerificationSummary};

/// Conformance tooling for strbridge.
#[derive(Debug, Parser)]
#[command(name = "strbridge-harness")]
#[command(about = "Conformance testing harness for strbridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture the reference conversion behavior as a fixture file.
    Capture {
        /// Output path for the fixture JSON.
        #[arg(long, default_value = "tests/conformance/fixtures/convert.json")]
        output: PathBuf,
    },
    /// Verify the conversion kernels against captured fixtures.
    Verify {
        /// Directory containing fixture JSON files.
        #[arg(long, default_value = "tests/conformance/fixtures")]
        fixture: PathBuf,
        /// Output report path (markdown; a JSON twin is written alongside).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Optional fixed timestamp string for deterministic report generation.
        #[arg(long)]
        timestamp: Option<String>,
        /// Mode to verify (`strict`, `hardened`, or `both`).
        #[arg(long, default_value = "both")]
        mode: String,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Capture { output } => {
            let set = capture_conversion_fixture_set()?;
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
            }
            std::fs::write(&output, set.to_json()?).map_err(|e| HarnessError::io(&output, e))?;
            eprintln!(
                "Captured {} {} cases to {}",
                set.cases.len(),
                set.family,
                output.display()
            );
        }
        Command::Verify {
            fixture,
            report,
            log,
            timestamp,
            mode,
        } => {
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let fixture_sets = FixtureSet::load_dir(&fixture)?;
            if fixture_sets.is_empty() {
                return Err(format!("No fixture JSON files found in {}", fixture.display()).into());
            }

            let modes: &[&str] = match mode.as_str() {
                "strict" => &["strict"],
                "hardened" => &["hardened"],
                "both" => &["strict", "hardened"],
                other => return Err(format!("unknown mode `{other}`").into()),
            };

            let timestamp = timestamp.unwrap_or_else(now_utc);
            let mut emitter = match &log {
                Some(path) => Some(
                    LogEmitter::to_file(path, "convert", &timestamp)
                        .map_err(|e| HarnessError::io(path, e))?,
                ),
                None => None,
            };

            let started = Instant::now();
            let mut summaries = Vec::new();
            for &mode in modes {
                let runner = TestRunner::new("fixture-verify", mode);
                let mut results = Vec::new();
                for set in &fixture_sets {
                    results.extend(runner.run(set));
                }
                results.sort_by(|a, b| {
                    a.function
                        .cmp(&b.function)
                        .then_with(|| a.case_name.cmp(&b.case_name))
                });
                summaries.push(VerificationSummary::from_results(mode, results));
            }

            if let Some(emitter) = emitter.as_mut() {
                emit_results(emitter, &summaries, started.elapsed().as_millis() as u64)
                    .map_err(|e| HarnessError::io(log.as_deref().unwrap_or(Path::new("-")), e))?;
            }

            let total: usize = summaries.iter().map(|s| s.total).sum();
            let failed: usize = summaries.iter().map(|s| s.failed).sum();
            eprintln!(
                "Verification complete: total={total}, passed={}, failed={failed}",
                total - failed
            );

            if let Some(report_path) = report {
                eprintln!("Writing report to {}", report_path.display());
                let markdown = strbridge_harness::report::render_markdown(
                    "strbridge Conformance Report",
                    &timestamp,
                    &summaries,
                );
                write(&report_path, markdown.as_bytes())?;
                let json_path = report_path.with_extension("json");
                write(&json_path, serde_json::to_string_pretty(&summaries)?.as_bytes())?;

                let mut index = ArtifactIndex::new(&timestamp, "convert");
                for path in [&report_path, &json_path] {
                    index
                        .add_file(path, "report")
                        .map_err(|e| HarnessError::io(path, e))?;
                }
                if let Some(log_path) = &log {
                    index
                        .add_file(log_path, "log")
                        .map_err(|e| HarnessError::io(log_path, e))?;
                }
                let index_path = report_path.with_extension("artifacts.json");
                write(&index_path, index.to_json()?.as_bytes())?;
            }

            if failed > 0 {
                return Err(HarnessError::VerificationFailed { failed, total }.into());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log).map_err(|e| HarnessError::io(&log, e))?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!(
                "Validated {lines} lines in {}: {} errors",
                log.display(),
                errors.len()
            );
            if !errors.is_empty() {
                return Err("structured log validation failed".into());
            }
        }
    }

    Ok(())
}

fn emit_results(
    emitter: &mut LogEmitter,
    summaries: &[VerificationSummary],
    duration_ms: u64,
) -> std::io::Result<()> {
    emitter.emit(LogLevel::Info, "run_start")?;
    for summary in summaries {
        for result in &summary.results {
            let (level, outcome) = if result.passed {
                (LogLevel::Info, Outcome::Pass)
            } else {
                (LogLevel::Error, Outcome::Fail)
            };
            let mut entry = LogEntry::new("", level, "case_result")
                .with_stream(StreamKind::Conformance)
                .with_mode(&summary.mode)
                .with_case(&result.function, &result.case_name)
                .with_outcome(outcome);
            if let Some(action) = &result.healing_action {
                entry = entry.with_healing_action(action);
            }
            if !result.passed {
                entry = entry.with_details(serde_json::json!({
                    "expected": result.expected,
                    "actual": result.actual,
                }));
            }
            emitter.emit_entry(entry)?;
        }
    }

    let failed: usize = summaries.iter().map(|s| s.failed).sum();
    let summary = LogEntry::new("", LogLevel::Info, "run_end")
        .with_stream(StreamKind::Conformance)
        .with_outcome(if failed == 0 {
            Outcome::Pass
        } else {
            Outcome::Fail
        })
        .with_duration_ms(duration_ms);
    emitter.emit_entry(summary)?;
    emitter.flush()
}

fn write(path: &Path, contents: &[u8]) -> Result<(), HarnessError> {
    std::fs::write(path, contents).map_err(|e| HarnessError::io(path, e))
}
