use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::error::{Error, Result};
use crate::interfaces::{CheckpointStore, RawSource};

/// In-process raw source and checkpoint store.
///
/// Share one instance (behind an `Arc`) between pipeline runs to hand a stage
/// boundary from one run to the next without touching disk.
#[derive(Default)]
pub struct MemoryStorage {
    raw: Vec<u8>,
    stages: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        MemoryStorage {
            raw: raw.into(),
            stages: RwLock::new(HashMap::new()),
        }
    }

    pub async fn stage_bytes(&self, stage: &str) -> Option<Vec<u8>> {
        self.stages.read().await.get(stage).cloned()
    }
}

#[async_trait]
impl RawSource for MemoryStorage {
    async fn load(&self) -> Result<Vec<u8>> {
        Ok(self.raw.clone())
    }
}

#[async_trait]
impl CheckpointStore for MemoryStorage {
    async fn load_stage(&self, stage: &str) -> Result<Vec<u8>> {
        self.stage_bytes(stage).await.ok_or_else(|| Error::Checkpoint {
            stage: stage.to_string(),
            reason: "no checkpoint saved".to_string(),
        })
    }

    async fn save_stage(&self, stage: &str, data: &[u8]) -> Result<()> {
        self.stages.write().await.insert(stage.to_string(), data.to_vec());
        Ok(())
    }
}
