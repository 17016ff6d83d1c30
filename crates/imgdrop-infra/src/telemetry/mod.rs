//! Tracing subscriber initialization
//!
//! `RUST_LOG` takes precedence over the configured level when it is set.

use anyhow::{Context, Result};
use imgdrop_core::{LogFormat, LoggingConfig};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global tracing subscriber.
pub fn init_telemetry(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => env_filter(&config.level)?,
    };

    tracing_subscriber::registry()
        .with(fmt_layer(config)?)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        level = %config.level,
        format = ?config.format,
        file = ?config.file,
        "Logging initialized"
    );
    Ok(())
}

/// Filter for the configured verbosity.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{}'", level))
}

fn fmt_layer(config: &LoggingConfig) -> Result<BoxedLayer> {
    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let layer: BoxedLayer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(config.file.is_none())
            .with_writer(writer)
            .boxed(),
    };

    Ok(layer)
}
