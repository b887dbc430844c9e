//! CLI entrypoint for the funcman harness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use funcman_cache::SystemBinder;
use funcman_core::NamePolicy;
use funcman_harness::structured_log::{LogEmitter, LogEntry, LogLevel};
use funcman_harness::{JsonlObserver, ProbeOptions};

/// Override-table tooling for funcman.
#[derive(Debug, Parser)]
#[command(name = "funcman-harness")]
#[command(about = "Lint override tables, probe resolution, validate logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an override table and report problems without loading anything.
    CheckConfig {
        /// Override table path.
        #[arg(long)]
        config: PathBuf,
        /// Over-length name policy (`truncate` or `reject`).
        #[arg(long, default_value = "truncate")]
        policy: String,
        /// Keys the host registers; lines naming other keys are flagged.
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Register keys, apply a table, bind through the platform loader, report.
    Probe {
        /// Override table path.
        #[arg(long)]
        config: PathBuf,
        /// Key to register (repeatable).
        #[arg(long = "key", required = true)]
        keys: Vec<String>,
        /// Over-length name policy (`truncate` or `reject`).
        #[arg(long, default_value = "truncate")]
        policy: String,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Run identifier used in trace ids.
        #[arg(long, default_value = "probe")]
        run_id: String,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn write_or_print(body: &str, output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, body)
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::CheckConfig {
            config,
            policy,
            keys,
            output,
        } => {
            let keys = (!keys.is_empty()).then_some(keys.as_slice());
            let lint =
                funcman_harness::lint_file(&config, NamePolicy::from_str_loose(&policy), keys)?;
            let body = serde_json::to_string_pretty(&lint)?;
            write_or_print(&body, output.as_deref())?;
            if !lint.is_clean() {
                return Err(format!(
                    "{}: {} skipped line(s), {} unknown key(s)",
                    config.display(),
                    lint.skipped.len(),
                    lint.unknown_keys().len()
                )
                .into());
            }
        }
        Command::Probe {
            config,
            keys,
            policy,
            log,
            run_id,
        } => {
            let observer = match &log {
                Some(path) => Some(JsonlObserver::new(LogEmitter::to_file(
                    path, "probe", &run_id,
                )?)),
                None => None,
            };
            if let Some(observer) = &observer {
                observer.emit_entry(
                    LogEntry::new(String::new(), LogLevel::Info, "probe_start")
                        .with_details(serde_json::json!({ "config": config.display().to_string() })),
                )?;
            }

            let options = ProbeOptions {
                policy: NamePolicy::from_str_loose(&policy),
                observer: observer
                    .as_ref()
                    .map(|o| o as &dyn funcman_cache::ResolutionObserver),
            };
            let report = funcman_harness::probe(SystemBinder::new(), &config, &keys, options)?;

            if let Some(observer) = &observer {
                observer.emit_entry(
                    LogEntry::new(String::new(), LogLevel::Info, "probe_end")
                        .with_details(serde_json::json!({ "closed": report.closed })),
                )?;
                observer.flush()?;
                if observer.write_errors() > 0 {
                    eprintln!("warning: {} log write(s) failed", observer.write_errors());
                }
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = funcman_harness::validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(format!(
                    "{}: {} error(s) in {lines} line(s)",
                    log.display(),
                    errors.len()
                )
                .into());
            }
            eprintln!("{}: {lines} line(s) ok", log.display());
        }
    }

    Ok(())
}
