//! Configuration module for VC-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and reading seed URL lists.
//!
//! # Example
//!
//! ```no_run
//! use vc_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Worker limit: {}", config.batch.worker_limit);
//! ```

mod parser;
mod seeds;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, Config, ExtractionConfig, FetcherConfig, OutputConfig, UserAgentConfig,
    ValidationConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use seeds::{load_seeds, parse_seeds};
