use lazy_static::lazy_static;
use prometheus::{Counter, IntGauge, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Stage throughput
    pub static ref ROWS_EXTRACTED: Counter = Counter::new(
        "rows_extracted_total",
        "Total number of transaction rows extracted from the raw source"
    ).unwrap();

    pub static ref RECORDS_CONVERTED: Counter = Counter::new(
        "records_converted_total",
        "Total number of transactions converted to USD"
    ).unwrap();

    pub static ref AGGREGATES_INSERTED: Counter = Counter::new(
        "aggregates_inserted_total",
        "Total number of daily aggregates saved to the sink"
    ).unwrap();

    // Checkpoint metrics
    pub static ref CHECKPOINT_ROWS_WRITTEN: Counter = Counter::new(
        "checkpoint_rows_written_total",
        "Total number of rows written to stage checkpoints"
    ).unwrap();

    pub static ref CHECKPOINT_ROWS_LOADED: Counter = Counter::new(
        "checkpoint_rows_loaded_total",
        "Total number of rows loaded from stage checkpoints"
    ).unwrap();

    pub static ref ACTIVE_TASKS: IntGauge = IntGauge::new(
        "pipeline_active_tasks",
        "Number of pipeline tasks currently running"
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(ROWS_EXTRACTED.clone()))?;
    REGISTRY.register(Box::new(RECORDS_CONVERTED.clone()))?;
    REGISTRY.register(Box::new(AGGREGATES_INSERTED.clone()))?;
    REGISTRY.register(Box::new(CHECKPOINT_ROWS_WRITTEN.clone()))?;
    REGISTRY.register(Box::new(CHECKPOINT_ROWS_LOADED.clone()))?;
    REGISTRY.register(Box::new(ACTIVE_TASKS.clone()))?;
    Ok(())
}
