use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::error::Result;
use crate::interfaces::Sink;
use crate::observability::metrics::AGGREGATES_INSERTED;
use crate::pipeline::queue;
use crate::types::AggregateRecord;

/// Save every aggregate from `input` to the sink until the queue closes.
pub async fn insert(
    mut input: mpsc::Receiver<AggregateRecord>,
    sink: Arc<dyn Sink>,
    token: CancellationToken,
) -> Result<()> {
    let mut inserted = 0u64;

    while let Some(record) = queue::recv(&mut input, &token).await? {
        queue::cancellable(&token, sink.save(&record)).await?;

        AGGREGATES_INSERTED.inc();
        inserted += 1;
    }

    tracing::info!(inserted, "Insertion finished");
    Ok(())
}
