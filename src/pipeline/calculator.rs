use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};
use crate::interfaces::PriceResolver;
use crate::observability::metrics::RECORDS_CONVERTED;
use crate::pipeline::queue;
use crate::types::{ConvertedRecord, RawTransaction};

/// Input queue drained concurrently by every calculation worker.
pub type SharedInput = Arc<Mutex<mpsc::Receiver<RawTransaction>>>;

/// One calculation worker: converts transactions until the shared input closes.
///
/// Each worker owns its own clone of the output sender. The output queue
/// closes once the last worker returns and drops its clone, so it is closed
/// exactly once without any worker having to coordinate the close.
pub async fn calculate(
    worker: usize,
    input: SharedInput,
    output: mpsc::Sender<ConvertedRecord>,
    resolver: Arc<dyn PriceResolver>,
    token: CancellationToken,
) -> Result<()> {
    let result = async {
        let mut converted = 0u64;

        while let Some(transaction) = queue::recv_shared(&input, &token).await? {
            let record = convert(&transaction, resolver.as_ref(), &token).await?;
            queue::send(&output, record, &token).await?;

            RECORDS_CONVERTED.inc();
            converted += 1;
        }

        tracing::debug!(worker, converted, "Calculation worker finished");
        Ok::<_, Error>(())
    }
    .await;

    queue::cancel_on_error(&token, result)
}

/// Price one transaction in USD, negative for sells.
pub async fn convert(
    transaction: &RawTransaction,
    resolver: &dyn PriceResolver,
    token: &CancellationToken,
) -> Result<ConvertedRecord> {
    let kind = transaction.event_kind()?;

    let usd = queue::cancellable(
        token,
        resolver.convert_to_usd(transaction.currency_amount, &transaction.currency_symbol),
    )
    .await?;

    Ok(ConvertedRecord {
        project_id: transaction.project_id.clone(),
        date: transaction.date(),
        usd_amount: kind.sign() * usd,
    })
}
