use crate::error::Result;
use async_trait::async_trait;

/// Durable byte store for the rows handed from one pipeline stage to the next.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load_stage(&self, stage: &str) -> Result<Vec<u8>>;
    async fn save_stage(&self, stage: &str, data: &[u8]) -> Result<()>;
}
