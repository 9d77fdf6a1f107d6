use std::sync::Arc;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use volume_sequence::config::{GroupBy, PipelineConfig};
use volume_sequence::interfaces::{CheckpointStore, Sink};
use volume_sequence::price_infra::HardcodedResolver;
use volume_sequence::storage::{FileStorage, MemoryStorage};
use volume_sequence::types::AggregateRecord;
use volume_sequence::warehouse::MemorySink;
use volume_sequence::{Backend, Error, Pipeline};

const HEADER: &str = "app,ts,event,project_id,source,ident,user_id,session_id,country,device_type,device_os,device_os_ver,device_browser,device_browser_ver,props,nums";

fn row(ts: &str, event: &str, project: &str, symbol: &str, amount: &str) -> String {
    format!(
        "seq-market,{ts},{event},{project},,1,u,s,DE,desktop,linux,x86_64,chrome,122.0.0.0,\
         \"{{\"\"currencySymbol\"\":\"\"{symbol}\"\"}}\",\"{{\"\"currencyValueDecimal\"\":\"\"{amount}\"\"}}\""
    )
}

fn log(rows: &[String]) -> Vec<u8> {
    let mut out = HEADER.to_string();
    for r in rows {
        out.push('\n');
        out.push_str(r);
    }
    out.push('\n');
    out.into_bytes()
}

fn memory_backend(storage: &Arc<MemoryStorage>, sink: &Arc<MemorySink>) -> Backend {
    Backend::new(
        storage.clone(),
        Arc::new(HardcodedResolver::new()),
        storage.clone(),
        sink.clone(),
    )
}

async fn run(backend: Backend, config: PipelineConfig) -> Result<(), Error> {
    Pipeline::new(backend, config).run(&CancellationToken::new()).await
}

fn sorted(mut records: Vec<AggregateRecord>) -> Vec<AggregateRecord> {
    records.sort_by(|a, b| (&a.date, &a.project_id).cmp(&(&b.date, &b.project_id)));
    records
}

/// Three days of trades for one project, amounts exact in binary floating point.
fn week_of_trades() -> Vec<u8> {
    log(&[
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
        row("2024-04-15 03:00:00.000", "BUY_ITEMS", "4974", "USDC.e", "2.5"),
        row("2024-04-16 10:30:00.500", "SELL_ITEMS", "4974", "USDC", "0.25"),
        row("2024-04-16 11:00:00.000", "BUY_ITEMS", "4974", "USDC", "4"),
        row("2024-04-17 23:59:59.999", "SELL_ITEMS", "4974", "USDC", "0.5"),
        row("2024-04-17 00:00:00.000", "BUY_ITEMS", "4974", "usdc", "8"),
    ])
}

#[tokio::test]
async fn test_three_buys_single_day() {
    let storage = Arc::new(MemoryStorage::new(log(&[
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "USDC", "1.0"),
        row("2024-04-15 12:00:00.000", "BUY_ITEMS", "4974", "USDC", "1.0"),
        row("2024-04-15 20:45:31.002", "BUY_ITEMS", "4974", "USDC", "1.0"),
    ])));
    let sink = Arc::new(MemorySink::new());

    run(memory_backend(&storage, &sink), PipelineConfig::default()).await.unwrap();

    assert_eq!(sink.records().await, vec![AggregateRecord {
        date: "2024-04-15".to_string(),
        project_id: "4974".to_string(),
        tx_count: 3,
        total_usd: 3.0,
    }]);
}

#[tokio::test]
async fn test_sells_net_against_buys() {
    let storage = Arc::new(MemoryStorage::new(week_of_trades()));
    let sink = Arc::new(MemorySink::new());

    run(memory_backend(&storage, &sink), PipelineConfig::default()).await.unwrap();

    let records = sorted(sink.records().await);
    let totals: Vec<(&str, u64, f64)> = records
        .iter()
        .map(|r| (r.date.as_str(), r.tx_count, r.total_usd))
        .collect();

    assert_eq!(totals, vec![
        ("2024-04-15", 2, 3.5),
        ("2024-04-16", 2, 3.75),
        ("2024-04-17", 2, 7.5),
    ]);
}

#[tokio::test]
async fn test_split_runs_match_single_run() {
    let single_storage = Arc::new(MemoryStorage::new(week_of_trades()));
    let single_sink = Arc::new(MemorySink::new());
    run(memory_backend(&single_storage, &single_sink), PipelineConfig::default()).await.unwrap();

    let storage = Arc::new(MemoryStorage::new(week_of_trades()));
    let sink = Arc::new(MemorySink::new());

    run(memory_backend(&storage, &sink), PipelineConfig::with_stages(true, false, false)).await.unwrap();
    assert!(sink.records().await.is_empty());

    run(memory_backend(&storage, &sink), PipelineConfig::with_stages(false, true, false)).await.unwrap();
    assert!(sink.records().await.is_empty());
    assert!(storage.stage_bytes("calculation").await.is_some());

    run(memory_backend(&storage, &sink), PipelineConfig::with_stages(false, false, true)).await.unwrap();

    assert_eq!(sorted(sink.records().await), sorted(single_sink.records().await));
}

#[tokio::test]
async fn test_worker_count_does_not_change_result() {
    let one_storage = Arc::new(MemoryStorage::new(week_of_trades()));
    let one_sink = Arc::new(MemorySink::new());
    run(memory_backend(&one_storage, &one_sink), PipelineConfig::default().workers(1)).await.unwrap();

    let many_storage = Arc::new(MemoryStorage::new(week_of_trades()));
    let many_sink = Arc::new(MemorySink::new());
    run(memory_backend(&many_storage, &many_sink), PipelineConfig::default().workers(8)).await.unwrap();

    assert_eq!(sorted(many_sink.records().await), sorted(one_sink.records().await));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_malformed_row_aborts_without_inserting() {
    let mut rows = vec![
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
        row("2024-04-15 03:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
        row("2024-04-15 04:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
    ];
    rows.push("seq-market,2024-04-15 05:00:00.000,BUY_ITEMS".to_string());
    let storage = Arc::new(MemoryStorage::new(log(&rows)));
    let sink = Arc::new(MemorySink::new());

    let err = run(memory_backend(&storage, &sink), PipelineConfig::default().workers(4))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Parse { row: 5, .. }), "got {:?}", err);
    assert!(sink.records().await.is_empty());
}

#[tokio::test]
async fn test_unknown_event_fails_run() {
    let storage = Arc::new(MemoryStorage::new(log(&[
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
        row("2024-04-15 03:15:07.167", "LIST_ITEMS", "4974", "USDC", "1"),
    ])));
    let sink = Arc::new(MemorySink::new());

    let err = run(memory_backend(&storage, &sink), PipelineConfig::default()).await.unwrap_err();

    assert!(matches!(err, Error::UnknownEventKind(ref event) if event == "LIST_ITEMS"));
    assert!(sink.records().await.is_empty());
}

#[tokio::test]
async fn test_unknown_currency_fails_run() {
    let storage = Arc::new(MemoryStorage::new(log(&[
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "DOGE", "1"),
    ])));
    let sink = Arc::new(MemorySink::new());

    let err = run(memory_backend(&storage, &sink), PipelineConfig::default()).await.unwrap_err();

    assert!(matches!(err, Error::UnknownCurrency(ref symbol) if symbol == "DOGE"));
}

#[tokio::test]
async fn test_calculate_without_extraction_checkpoint_fails() {
    let storage = Arc::new(MemoryStorage::new(week_of_trades()));
    let sink = Arc::new(MemorySink::new());

    let err = run(memory_backend(&storage, &sink), PipelineConfig::with_stages(false, true, true))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Checkpoint { ref stage, .. } if stage == "extraction"));
    assert!(sink.records().await.is_empty());
}

#[tokio::test]
async fn test_corrupt_calculation_checkpoint_fails() {
    let storage = Arc::new(MemoryStorage::new(Vec::new()));
    storage
        .save_stage("calculation", b"2024-04-15,4974,3,3\n2024-04-16,4974,many,1\n")
        .await
        .unwrap();
    let sink = Arc::new(MemorySink::new());

    let err = run(memory_backend(&storage, &sink), PipelineConfig::with_stages(false, false, true))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::CheckpointDecode { row: 2, .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_group_by_date_keeps_last_project() {
    let storage = Arc::new(MemoryStorage::new(log(&[
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
        row("2024-04-15 03:15:07.167", "BUY_ITEMS", "1660", "USDC", "2"),
    ])));
    let sink = Arc::new(MemorySink::new());

    run(memory_backend(&storage, &sink), PipelineConfig::default()).await.unwrap();

    assert_eq!(sink.records().await, vec![AggregateRecord {
        date: "2024-04-15".to_string(),
        project_id: "1660".to_string(),
        tx_count: 2,
        total_usd: 3.0,
    }]);
}

#[tokio::test]
async fn test_group_by_date_and_project() {
    let storage = Arc::new(MemoryStorage::new(log(&[
        row("2024-04-15 02:15:07.167", "BUY_ITEMS", "4974", "USDC", "1"),
        row("2024-04-15 03:15:07.167", "BUY_ITEMS", "1660", "USDC", "2"),
        row("2024-04-15 04:15:07.167", "SELL_ITEMS", "4974", "USDC", "0.5"),
    ])));
    let sink = Arc::new(MemorySink::new());
    let config = PipelineConfig::default().group_by(GroupBy::DateAndProject);

    run(memory_backend(&storage, &sink), config).await.unwrap();

    let records = sorted(sink.records().await);
    assert_eq!(records.len(), 2);
    assert_eq!((records[0].project_id.as_str(), records[0].tx_count, records[0].total_usd), ("1660", 1, 2.0));
    assert_eq!((records[1].project_id.as_str(), records[1].tx_count, records[1].total_usd), ("4974", 2, 0.5));
}

#[tokio::test]
async fn test_file_storage_split_runs() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("transactions.csv"), week_of_trades()).unwrap();
    let storage = Arc::new(FileStorage::new(dir.path(), "transactions.csv"));
    let sink = Arc::new(MemorySink::new());

    let backend = || {
        Backend::new(
            storage.clone(),
            Arc::new(HardcodedResolver::new()),
            storage.clone(),
            sink.clone() as Arc<dyn Sink>,
        )
    };

    run(backend(), PipelineConfig::with_stages(true, true, false)).await.unwrap();
    assert!(dir.path().join("calculation.csv").exists());
    assert!(!dir.path().join("extraction.csv").exists());

    run(backend(), PipelineConfig::with_stages(false, false, true)).await.unwrap();

    let records = sorted(sink.records().await);
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].total_usd, 3.75);
}
