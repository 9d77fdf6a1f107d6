use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};
use crate::interfaces::RawSource;
use crate::observability::metrics::ROWS_EXTRACTED;
use crate::pipeline::queue;
use crate::types::transaction::INPUT_FIELD_COUNT;
use crate::types::RawTransaction;

/// Load the raw log from `source` and stream its transactions into `output`.
///
/// `output` is dropped, closing the queue, whether extraction succeeds or not.
pub async fn run_extraction(
    source: Arc<dyn RawSource>,
    output: mpsc::Sender<RawTransaction>,
    token: CancellationToken,
) -> Result<()> {
    let result = async {
        let data = queue::cancellable(&token, source.load()).await?;
        let rows = extract(&data, &output, &token).await?;

        tracing::info!(rows, "Extraction finished");
        Ok::<_, Error>(())
    }
    .await;

    queue::cancel_on_error(&token, result)
}

/// Parse the raw log and send one transaction per data row, in source order.
///
/// The first row is a header and must carry exactly `INPUT_FIELD_COUNT`
/// fields. Any malformed row fails the whole extraction.
pub async fn extract(
    data: &[u8],
    output: &mpsc::Sender<RawTransaction>,
    token: &CancellationToken,
) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut records = reader.records();

    let header = match records.next() {
        Some(header) => header.map_err(|e| Error::parse(1, format!("reading header: {}", e)))?,
        None => return Err(Error::InvalidHeader { expected: INPUT_FIELD_COUNT, found: 0 }),
    };

    if header.len() != INPUT_FIELD_COUNT {
        return Err(Error::InvalidHeader {
            expected: INPUT_FIELD_COUNT,
            found: header.len(),
        });
    }

    let mut rows = 0;
    for (idx, result) in records.enumerate() {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Header is row 1
        let row = idx + 2;
        let record = result.map_err(|e| Error::parse(row, e.to_string()))?;
        let transaction = RawTransaction::from_source_row(&record)
            .map_err(|reason| Error::parse(row, reason))?;

        queue::send(output, transaction, token).await?;
        ROWS_EXTRACTED.inc();
        rows += 1;
    }

    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::queue::bounded;

    pub(crate) const HEADER: &str = "app,ts,event,project_id,source,ident,user_id,session_id,country,device_type,device_os,device_os_ver,device_browser,device_browser_ver,props,nums";

    /// One raw log row with the JSON fragments quoted the way the exporter writes them.
    pub(crate) fn source_row(ts: &str, event: &str, project: &str, symbol: &str, amount: &str) -> String {
        format!(
            "seq-market,{ts},{event},{project},,1,0896ae95dc,5d8afd8fec,DE,desktop,linux,x86_64,chrome,122.0.0.0,\"{{\"\"currencySymbol\"\":\"\"{symbol}\"\",\"\"chainId\"\":\"\"137\"\"}}\",\"{{\"\"currencyValueDecimal\"\":\"\"{amount}\"\"}}\"",
        )
    }

    pub(crate) fn source_log(rows: &[String]) -> Vec<u8> {
        let mut log = String::from(HEADER);
        for row in rows {
            log.push('\n');
            log.push_str(row);
        }
        log.push('\n');
        log.into_bytes()
    }

    async fn drain(mut rx: mpsc::Receiver<RawTransaction>) -> Vec<RawTransaction> {
        let mut out = Vec::new();
        while let Some(tx) = rx.recv().await {
            out.push(tx);
        }
        out
    }

    #[tokio::test]
    async fn test_extract_preserves_row_order() {
        let data = source_log(&[
            source_row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "SFL", "0.5"),
            source_row("2024-04-15 03:00:00.000", "SELL_ITEMS", "4974", "MATIC", "2"),
            source_row("2024-04-16 10:30:00.250", "BUY_ITEMS", "1660", "USDC", "10.25"),
        ]);

        let (tx, rx) = bounded();
        let token = CancellationToken::new();

        let rows = extract(&data, &tx, &token).await.unwrap();
        drop(tx);
        let transactions = drain(rx).await;

        assert_eq!(rows, 3);
        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions[0].currency_symbol, "SFL");
        assert_eq!(transactions[0].currency_amount, 0.5);
        assert_eq!(transactions[1].event, "SELL_ITEMS");
        assert_eq!(transactions[1].currency_symbol, "MATIC");
        assert_eq!(transactions[2].project_id, "1660");
        assert_eq!(transactions[2].date(), "2024-04-16");
    }

    #[tokio::test]
    async fn test_header_only_emits_nothing() {
        let data = source_log(&[]);
        let (tx, _rx) = bounded();

        assert_eq!(extract(&data, &tx, &CancellationToken::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_short_header() {
        let data = b"app,ts,event\n".to_vec();
        let (tx, _rx) = bounded();

        let err = extract(&data, &tx, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { expected: 16, found: 3 }));
    }

    #[tokio::test]
    async fn test_rejects_empty_input() {
        let (tx, _rx) = bounded();

        let err = extract(b"", &tx, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { found: 0, .. }));
    }

    #[tokio::test]
    async fn test_malformed_row_aborts_with_row_number() {
        let data = source_log(&[
            source_row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "SFL", "0.5"),
            source_row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "SFL", "not-a-number"),
            source_row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "SFL", "0.5"),
        ]);
        let (tx, rx) = bounded();

        let err = extract(&data, &tx, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Parse { row: 3, .. }));

        drop(tx);
        assert_eq!(drain(rx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_row() {
        let data = source_log(&[
            source_row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "SFL", "0.5"),
        ]);
        let (tx, _rx) = bounded();
        let token = CancellationToken::new();
        token.cancel();

        assert!(matches!(extract(&data, &tx, &token).await, Err(Error::Cancelled)));
    }
}
