use serde::Deserialize;

pub mod conversion;
pub mod loader;

pub use conversion::{ApiKeyType, CoinGeckoConfig, ConversionConfig, ConversionKind};
pub use loader::AppConfig;

/// How the aggregator keys its buckets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One bucket per date; the bucket keeps the last project id folded into it.
    #[default]
    Date,
    /// One bucket per (date, project id).
    DateAndProject,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub extract: bool,
    #[serde(default)]
    pub calculate: bool,
    #[serde(default)]
    pub insert: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub group_by: GroupBy,
}

fn default_workers() -> usize {
    1
}

impl PipelineConfig {
    /// Select stages explicitly. Selecting none enables all three.
    pub fn with_stages(extract: bool, calculate: bool, insert: bool) -> Self {
        PipelineConfig {
            extract,
            calculate,
            insert,
            ..Default::default()
        }
        .normalized()
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.normalized()
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    /// Apply the defaulting rules: no stage selected means every stage, and
    /// at least one calculation worker.
    pub fn normalized(mut self) -> Self {
        if !self.extract && !self.calculate && !self.insert {
            self.extract = true;
            self.calculate = true;
            self.insert = true;
        }

        if self.workers == 0 {
            self.workers = 1;
        }

        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            extract: true,
            calculate: true,
            insert: true,
            workers: 1,
            group_by: GroupBy::Date,
        }
    }
}

/// Where the raw transaction log is read from. Checkpoints always live on
/// the local filesystem.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    File,
    /// Google Cloud Storage, `dir` names the bucket.
    Bucket,
}

impl std::str::FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" | "filesystem" => Ok(StorageKind::File),
            "bucket" => Ok(StorageKind::Bucket),
            other => Err(format!("invalid storage type {}", other)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Directory holding the raw log and the stage checkpoints. With bucket
    /// storage it also names the bucket the raw log is read from.
    pub dir: String,
    /// Raw transaction log, relative to `dir`.
    pub file: String,
    /// Storage API endpoint override, e.g. a local emulator. Requests to it
    /// are not authenticated.
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            kind: StorageKind::Bucket,
            dir: chrono::Local::now().format("%Y-%m-%d").to_string(),
            file: "transactions.csv".to_string(),
            endpoint: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseKind {
    Print,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub kind: WarehouseKind,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        WarehouseConfig {
            kind: WarehouseKind::Print,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub verbose: bool,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            verbose: false,
            json: false,
        }
    }
}
