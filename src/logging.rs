//! Diagnostic logging setup
//!
//! Events go to the console and, when a log file is given, are also appended
//! to that file without ANSI colors.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the event filter for the given verbosity flags
pub fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vc_harvester=info,warn"),
            1 => EnvFilter::new("vc_harvester=debug,info"),
            2 => EnvFilter::new("vc_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Opens a log file for appending, creating it and its parent directory if needed
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Builds the subscriber: a console layer plus an optional file layer
pub fn build_subscriber(
    filter: EnvFilter,
    log_file: Option<File>,
) -> impl Subscriber + Send + Sync + 'static {
    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
}

/// Installs the global subscriber
pub fn init(verbose: u8, quiet: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let file = log_file.map(open_log_file).transpose()?;
    build_subscriber(build_filter(verbose, quiet), file).init();
    Ok(())
}
