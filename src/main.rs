use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use volume_sequence::config::{AppConfig, ApiKeyType, ConversionKind, StorageKind};
use volume_sequence::observability::metrics::{
    register_metrics, AGGREGATES_INSERTED, RECORDS_CONVERTED, ROWS_EXTRACTED,
};
use volume_sequence::observability::tracing::init_tracing;
use volume_sequence::{Backend, Pipeline};

#[derive(Parser)]
#[command(name = "sequence", about = "Daily USD trading volume per project")]
struct Cli {
    /// Deployment environment, selects config/<env>
    #[arg(long, env = "ENVIRONMENT", default_value = "dev", global = true)]
    env: String,

    #[arg(short, long, env = "VERBOSE", global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, env = "JSON_LOGS", global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline stages
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Enable extraction
    #[arg(short = 'e', long, env = "EXTRACTOR_ENABLED")]
    extractor: bool,

    /// Enable calculation
    #[arg(short = 'c', long, env = "CALCULATOR_ENABLED")]
    calculator: bool,

    /// Enable insertion
    #[arg(short = 'i', long, env = "INSERTION_ENABLED")]
    insertion: bool,

    /// Number of calculation workers
    #[arg(short = 'w', long, env = "CALCULATOR_WORKERS")]
    workers: Option<usize>,

    /// Directory holding the raw log and checkpoints
    #[arg(long, env = "DIR")]
    dir: Option<String>,

    /// Raw transaction log inside the directory
    #[arg(long, env = "FILE")]
    file: Option<String>,

    /// Where the raw log is read from: bucket or file
    #[arg(long = "storage-type", visible_alias = "storage", env = "STORAGE_TYPE")]
    storage_type: Option<String>,

    /// Storage API endpoint override, e.g. an emulator
    #[arg(long, env = "STORAGE_EMULATOR_HOST")]
    storage_endpoint: Option<String>,

    /// Local files, hardcoded rates and printed output
    #[arg(long, env = "TEST_MODE")]
    test: bool,

    /// Price conversion backend: hardcoded or coingecko
    #[arg(long, env = "CONVERSOR")]
    conversor: Option<String>,

    #[arg(long, env = "CG_API_KEY", hide_env_values = true)]
    coingecko_api_key: Option<String>,

    /// demo or pro
    #[arg(long, env = "CG_API_KEY_TYPE")]
    coingecko_api_key_type: Option<String>,
}

impl RunArgs {
    /// Flags given on the command line win over file and environment config.
    fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        if self.extractor || self.calculator || self.insertion {
            config.pipeline.extract = self.extractor;
            config.pipeline.calculate = self.calculator;
            config.pipeline.insert = self.insertion;
        }
        if let Some(workers) = self.workers {
            config.pipeline.workers = workers;
        }
        config.pipeline = config.pipeline.clone().normalized();

        if let Some(dir) = &self.dir {
            config.storage.dir = dir.clone();
        }
        if let Some(file) = &self.file {
            config.storage.file = file.clone();
        }
        if let Some(kind) = &self.storage_type {
            config.storage.kind = kind.parse::<StorageKind>().map_err(anyhow::Error::msg)?;
        }
        if let Some(endpoint) = &self.storage_endpoint {
            config.storage.endpoint = Some(endpoint.clone());
        }
        if self.test {
            config.test_mode = true;
        }

        if let Some(conversor) = &self.conversor {
            config.conversion.kind = match conversor.as_str() {
                "hardcoded" => ConversionKind::Hardcoded,
                "coingecko" => ConversionKind::Coingecko,
                other => anyhow::bail!("invalid conversor {}", other),
            };
        }
        if let Some(key) = &self.coingecko_api_key {
            config.conversion.coingecko.key = key.clone();
        }
        if let Some(key_type) = &self.coingecko_api_key_type {
            config.conversion.coingecko.key_type = key_type
                .parse::<ApiKeyType>()
                .map_err(anyhow::Error::msg)?;
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.env).context("loading configuration")?;
    config.logging.verbose |= cli.verbose;
    config.logging.json |= cli.json_logs;

    let Command::Run(args) = &cli.command;
    args.apply(&mut config)?;
    config.validate().context("validating configuration")?;

    init_tracing(&config.logging)?;
    register_metrics().context("registering metrics")?;

    tracing::info!(
        environment = %config.environment,
        test_mode = config.test_mode,
        dir = %config.storage.dir,
        "Starting sequence"
    );

    let backend = Backend::from_config(&config).context("building backend")?;
    let pipeline = Pipeline::new(backend, config.pipeline.clone());

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling pipeline");
            shutdown.cancel();
        }
    });

    pipeline.run(&token).await.context("running pipeline")?;

    tracing::info!(
        rows_extracted = ROWS_EXTRACTED.get(),
        records_converted = RECORDS_CONVERTED.get(),
        aggregates_inserted = AGGREGATES_INSERTED.get(),
        "Done"
    );

    Ok(())
}
