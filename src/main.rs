use clap::Parser;
use galdiff::cli::{Cli, Command};
use galdiff::config::Config;
use galdiff::report;
use galdiff::scan::{self, CollectError, RawSnapshot};
use galdiff::session::{
    CompareResult, DeleteOutcome, ImportOutcome, RecordOutcome, ScanSession,
};
use galdiff::store::{SnapshotStore, SqliteBackend};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

fn read_payload(path: &Path) -> Result<Option<RawSnapshot>, String> {
    let text = read_input(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    scan::parse_raw(&text).map_err(|e| e.to_string())
}

/// Print one outcome, as JSON or as a status line plus optional body.
fn emit<T: Serialize>(config: &Config, outcome: &T, status: String, body: String) {
    if config.json_output {
        match report::json::render(outcome) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error encoding output: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("{status}");
        print!("{body}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let backend = match &config.db_path {
        Some(path) => SqliteBackend::open(path),
        None => SqliteBackend::open_default(),
    };
    let backend = match backend {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error opening scan database: {e}");
            std::process::exit(1);
        }
    };

    let mut session = ScanSession::new(SnapshotStore::new(backend), config.filter.clone());

    match cli.command {
        Command::Record(args) => {
            let outcome = match read_payload(&args.input) {
                Ok(raw) => session.record_scan(raw),
                Err(reason) => RecordOutcome::CollectionFailure { reason },
            };

            emit(&config, &outcome, report::record_status(&outcome), String::new());

            if !matches!(outcome, RecordOutcome::Saved(_)) {
                std::process::exit(1);
            }
        }
        Command::Compare(args) => {
            let location_key = match (args.location, args.input) {
                (Some(location), _) => location,
                (None, Some(input)) => match read_payload(&input) {
                    Ok(Some(raw)) => raw.location_key.trim().to_string(),
                    Ok(None) => {
                        eprintln!("Error: {}", CollectError::NotObserved);
                        std::process::exit(1);
                    }
                    Err(reason) => {
                        eprintln!("Error: {reason}");
                        std::process::exit(1);
                    }
                },
                (None, None) => unreachable!("clap requires --location or --input"),
            };

            let result = session.compare_scan(&location_key, config.min_delta);
            let body = if matches!(result, CompareResult::Ok { .. }) {
                report::table::render(&result)
            } else {
                String::new()
            };

            emit(&config, &result, report::compare_status(&result), body);
        }
        Command::Last(args) => {
            let last = session.last_scan(&args.location);
            emit(&config, &last, report::last_status(&last), String::new());
        }
        Command::Delete(args) => {
            let outcome = session.delete_all(&args.location);
            emit(&config, &outcome, report::delete_status(&outcome), String::new());

            if matches!(outcome, DeleteOutcome::StorageFailure { .. }) {
                std::process::exit(1);
            }
        }
        Command::DeleteLast(args) => {
            let outcome = session.delete_newest(&args.location);
            emit(&config, &outcome, report::delete_status(&outcome), String::new());

            if matches!(outcome, DeleteOutcome::StorageFailure { .. }) {
                std::process::exit(1);
            }
        }
        Command::Import(args) => {
            let text = match read_input(&args.input) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("Error reading {}: {e}", args.input.display());
                    std::process::exit(1);
                }
            };

            let outcome = session.import_record(&args.location, &text);
            emit(&config, &outcome, report::import_status(&outcome), String::new());

            if matches!(outcome, ImportOutcome::Rejected { .. }) {
                std::process::exit(1);
            }
        }
    }
}
