#![forbid(unsafe_code)]

//! Tether demo binary entry point.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tether_core::{RuntimeConfig, logging};
use tether_demo::cli::Opts;
use tether_demo::{LoggingSurface, ObjectGraph, Script, session};

fn main() -> ExitCode {
    let opts = Opts::parse();
    logging::init();

    let mut config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(mode) = opts.mode {
        config = config.with_execution_mode(mode);
    }
    if let Some(threads) = opts.worker_threads {
        config = config.with_worker_threads(threads);
    }
    tracing::info!(?config, "starting session");

    let graph = match ObjectGraph::new(config, Duration::from_millis(opts.tick_ms)) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Failed to start worker pool: {e}");
            return ExitCode::FAILURE;
        }
    };

    let script = Script {
        tracks: opts.tracks,
        count: opts.count,
        ..Script::default()
    };
    let outcome = session::run(&graph, Arc::new(LoggingSurface), &script);
    graph.shutdown();

    match outcome {
        Ok(report) => {
            tracing::info!(?report, "session finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}
