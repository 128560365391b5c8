#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo binary.
//!
//! Parses args manually. `TETHER_DEMO_*` variables set defaults; flags
//! override them. Runtime settings (`TETHER_EXECUTION_MODE`, ...) are read
//! separately through `RuntimeConfig::from_env`.

use std::env;
use std::process;

use tether_core::ExecutionMode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Tether demo: a scripted session over the reference models

USAGE:
    tether-demo [OPTIONS]

OPTIONS:
    --mode=MODE          Execution mode: 'sync' or 'async' (default: from env, else async)
    --worker-threads=N   Worker threads in async mode (default: from env, else 2)
    --tracks=N           Tracks added on the playlist screen (default: 5)
    --count=N            Counter increment per request (default: 20)
    --tick-ms=N          Simulated cost of one counter step in ms (default: 50)
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    TETHER_LOG                Log filter directive (default: info)
    TETHER_EXECUTION_MODE     sync | async
    TETHER_WORKER_THREADS     Worker pool size
    TETHER_DEMO_TRACKS        Override --tracks
    TETHER_DEMO_COUNT         Override --count
    TETHER_DEMO_TICK_MS       Override --tick-ms";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Forced execution mode; `None` defers to the environment.
    pub mode: Option<ExecutionMode>,
    /// Forced worker thread count; `None` defers to the environment.
    pub worker_threads: Option<usize>,
    pub tracks: usize,
    pub count: u32,
    pub tick_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            mode: None,
            worker_threads: None,
            tracks: 5,
            count: 20,
            tick_ms: 50,
        }
    }
}

fn parse_value<T: std::str::FromStr>(flag: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

impl Opts {
    /// Parse command-line arguments and environment variables, exiting on
    /// `--help`, `--version` or bad input.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("tether-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(val) = get_env("TETHER_DEMO_TRACKS")
            && let Ok(n) = val.parse()
        {
            opts.tracks = n;
        }
        if let Some(val) = get_env("TETHER_DEMO_COUNT")
            && let Ok(n) = val.parse()
        {
            opts.count = n;
        }
        if let Some(val) = get_env("TETHER_DEMO_TICK_MS")
            && let Ok(n) = val.parse()
        {
            opts.tick_ms = n;
        }

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--mode=") {
                        match ExecutionMode::parse(val) {
                            Some(mode) => opts.mode = Some(mode),
                            None => {
                                return Err(ParseError::InvalidValue {
                                    flag: "--mode",
                                    value: val.to_string(),
                                });
                            }
                        }
                    } else if let Some(val) = other.strip_prefix("--worker-threads=") {
                        opts.worker_threads = Some(parse_value("--worker-threads", val)?);
                    } else if let Some(val) = other.strip_prefix("--tracks=") {
                        opts.tracks = parse_value("--tracks", val)?;
                    } else if let Some(val) = other.strip_prefix("--count=") {
                        opts.count = parse_value("--count", val)?;
                    } else if let Some(val) = other.strip_prefix("--tick-ms=") {
                        opts.tick_ms = parse_value("--tick-ms", val)?;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}
