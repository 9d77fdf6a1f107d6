use std::path::Path;
use crate::config::*;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    /// Force filesystem storage, the hardcoded rate table and the print sink.
    pub test_mode: bool,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub conversion: ConversionConfig,
    pub warehouse: WarehouseConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        Self::load_from(Path::new("config"), env)
    }

    /// Layer `<dir>/default`, then `<dir>/<env>`, then `VOLSEQ__*` variables.
    pub fn load_from(dir: &Path, env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(env)).required(false))
            .add_source(Environment::with_prefix("VOLSEQ").separator("__").try_parsing(true))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let mut app: AppConfig = config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        if app.environment.is_empty() {
            app.environment = env.to_string();
        }
        app.pipeline = app.pipeline.normalized();

        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.environment.as_str(), "dev" | "prd") {
            return Err(Error::ConfigError(format!("invalid environment {}", self.environment)));
        }

        if self.test_mode {
            return Ok(());
        }

        if self.conversion.kind == ConversionKind::Coingecko && self.conversion.coingecko.key.is_empty() {
            return Err(Error::ConfigError("coingecko api key is required".to_string()));
        }

        Ok(())
    }
}
