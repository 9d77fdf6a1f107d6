use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RawSource: Send + Sync {
    /// Load the whole raw transaction log.
    async fn load(&self) -> Result<Vec<u8>>;
}
