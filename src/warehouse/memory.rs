use async_trait::async_trait;
use tokio::sync::Mutex;
use crate::error::Result;
use crate::interfaces::Sink;
use crate::types::AggregateRecord;

/// Keeps every saved aggregate, in call order.
#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Vec<AggregateRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AggregateRecord> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn save(&self, record: &AggregateRecord) -> Result<()> {
        self.saved.lock().await.push(record.clone());
        Ok(())
    }
}
