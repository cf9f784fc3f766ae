//! jmx-elastic - Elasticsearch output writer for JMX metrics
//!
//! Bootstraps the destination index, validates configuration, or replays a
//! batch of already-polled results.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use jmx_elastic_writer::cli::{parse_replay, Cli};
use jmx_elastic_writer::config::ElasticWriterConfig;
use jmx_elastic_writer::elastic::{ElasticWriter, Mapping};
use jmx_elastic_writer::writer::{OutputWriter, WriteReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    jmx_elastic_writer::init_logging(&cli.log_level.to_string())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting jmx-elastic");

    // Load configuration, CLI values win
    let mut config = ElasticWriterConfig::load_or_default(&cli.config)?;
    if let Some(url) = cli.connection_url {
        config.connection_url = url;
    }
    if let Some(prefix) = cli.root_prefix {
        config.root_prefix = Some(prefix);
    }

    if cli.validate {
        config.validate()?;
        Mapping::bundled()?;
        println!("Configuration is valid");
        println!("index: {}", config.index_name());
        return Ok(());
    }

    let batches = match &cli.replay {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read replay file {}", path.display()))?;
            parse_replay(&contents)
                .with_context(|| format!("Failed to parse replay file {}", path.display()))?
        }
        None => Vec::new(),
    };

    let mut writer = ElasticWriter::new(config)?;
    info!(writer = %writer, "Writer configured");
    writer.start().await?;

    let mut total = WriteReport::default();
    for batch in &batches {
        let report = writer
            .write(&batch.server, &batch.query, &batch.results)
            .await?;
        total.merge(report);
    }

    writer.stop().await?;

    if cli.replay.is_some() {
        println!(
            "written: {}, failed: {}, skipped: {}",
            total.written, total.failed, total.skipped
        );
    }

    Ok(())
}
