use std::sync::Arc;
use crate::config::{AppConfig, ConversionKind, StorageKind, WarehouseKind};
use crate::error::Result;
use crate::interfaces::{CheckpointStore, PriceResolver, RawSource, Sink};
use crate::price_infra::{CoinGeckoResolver, HardcodedResolver};
use crate::storage::{BucketStorage, FileStorage};
use crate::warehouse::PrintSink;

/// The collaborators a pipeline run talks to.
#[derive(Clone)]
pub struct Backend {
    pub source: Arc<dyn RawSource>,
    pub resolver: Arc<dyn PriceResolver>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub sink: Arc<dyn Sink>,
}

impl Backend {
    pub fn new(
        source: Arc<dyn RawSource>,
        resolver: Arc<dyn PriceResolver>,
        checkpoints: Arc<dyn CheckpointStore>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Backend {
            source,
            resolver,
            checkpoints,
            sink,
        }
    }

    /// Build the collaborators named by `config`.
    ///
    /// In test mode the storage is always the filesystem, prices come from the
    /// hardcoded table and aggregates are printed.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.test_mode {
            tracing::info!(dir = %config.storage.dir, "Test mode, using local files and hardcoded rates");
            let storage = Arc::new(FileStorage::new(&config.storage.dir, config.storage.file.clone()));

            return Ok(Backend::new(
                storage.clone(),
                Arc::new(HardcodedResolver::new()),
                storage,
                Arc::new(PrintSink),
            ));
        }

        // Checkpoints stay on the local filesystem whatever the raw source is
        let files = Arc::new(FileStorage::new(&config.storage.dir, config.storage.file.clone()));
        let source: Arc<dyn RawSource> = match config.storage.kind {
            StorageKind::File => files.clone(),
            StorageKind::Bucket => Arc::new(
                BucketStorage::new(&config.storage.dir, &config.storage.file)
                    .with_endpoint(config.storage.endpoint.clone()),
            ),
        };
        let checkpoints: Arc<dyn CheckpointStore> = files;

        let resolver: Arc<dyn PriceResolver> = match config.conversion.kind {
            ConversionKind::Hardcoded => Arc::new(HardcodedResolver::new()),
            ConversionKind::Coingecko => Arc::new(CoinGeckoResolver::new(&config.conversion.coingecko)?),
        };

        let sink: Arc<dyn Sink> = match config.warehouse.kind {
            WarehouseKind::Print => Arc::new(PrintSink),
        };

        tracing::debug!(
            storage = ?config.storage.kind,
            conversion = ?config.conversion.kind,
            warehouse = ?config.warehouse.kind,
            "Backend configured"
        );

        Ok(Backend::new(source, resolver, checkpoints, sink))
    }
}
