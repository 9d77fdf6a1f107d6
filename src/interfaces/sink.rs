use crate::error::Result;
use crate::types::AggregateRecord;
use async_trait::async_trait;

#[async_trait]
pub trait Sink: Send + Sync {
    async fn save(&self, record: &AggregateRecord) -> Result<()>;
}
