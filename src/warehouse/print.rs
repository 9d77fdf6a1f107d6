use async_trait::async_trait;
use crate::error::Result;
use crate::interfaces::Sink;
use crate::types::AggregateRecord;

/// Writes every aggregate to stdout.
#[derive(Default)]
pub struct PrintSink;

#[async_trait]
impl Sink for PrintSink {
    async fn save(&self, record: &AggregateRecord) -> Result<()> {
        tracing::debug!(date = %record.date, project_id = %record.project_id, "Saving aggregate");
        println!("Save: {:?}", record);
        Ok(())
    }
}
