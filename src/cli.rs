//! CLI argument parsing for jmx-elastic
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Writer configuration file (default: elastic.yaml, env: JMX_ELASTIC_CONFIG)
//! - `--connection-url`: Elasticsearch URL (overrides config file, env: JMX_ELASTIC_URL)
//! - `--root-prefix`: Root prefix (overrides config file, env: JMX_ELASTIC_ROOT_PREFIX)
//! - `--validate`: Check configuration and the bundled mapping without connecting
//! - `--replay`: Write a JSON batch of results, then stop
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: JMX_ELASTIC_LOG_LEVEL)
//!
//! Without `--validate` or `--replay` the writer starts (creating the index
//! and mapping if needed) and stops again.

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

use crate::model::{JmxResult, Query, Server};

/// jmx-elastic - store polled JMX metrics in Elasticsearch
#[derive(Parser, Debug)]
#[command(name = "jmx-elastic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "elastic.yaml",
        env = "JMX_ELASTIC_CONFIG"
    )]
    pub config: PathBuf,

    /// Elasticsearch URL (overrides config file)
    #[arg(long, value_name = "URL", env = "JMX_ELASTIC_URL")]
    pub connection_url: Option<String>,

    /// Root prefix for index and metric names (overrides config file)
    #[arg(long, value_name = "PREFIX", env = "JMX_ELASTIC_ROOT_PREFIX")]
    pub root_prefix: Option<String>,

    /// Validate configuration and mapping without connecting
    #[arg(long, conflicts_with = "replay")]
    pub validate: bool,

    /// JSON file with a batch of results to write
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "JMX_ELASTIC_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// One batch in a `--replay` file
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayBatch {
    /// Server the results were polled from
    pub server: Server,
    /// Query that produced them
    pub query: Query,
    /// Polled results
    #[serde(default)]
    pub results: Vec<JmxResult>,
}

/// Parse a replay file: a single batch or an array of batches.
pub fn parse_replay(json: &str) -> serde_json::Result<Vec<ReplayBatch>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ReplayFile {
        Many(Vec<ReplayBatch>),
        One(ReplayBatch),
    }

    Ok(match serde_json::from_str(json)? {
        ReplayFile::Many(batches) => batches,
        ReplayFile::One(batch) => vec![batch],
    })
}
