use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::pipeline::Stage;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let default_level = if config.verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::ConfigError(format!("installing subscriber: {}", e)))
}

pub fn trace_stage(stage: Stage) -> Span {
    tracing::info_span!(
        "stage",
        stage = %stage,
    )
}

pub fn trace_worker(worker: usize) -> Span {
    tracing::info_span!(
        "calculation_worker",
        worker = worker,
    )
}

pub fn trace_checkpoint(stage: Stage, direction: &'static str) -> Span {
    tracing::info_span!(
        "checkpoint",
        stage = %stage,
        direction = direction,
    )
}
