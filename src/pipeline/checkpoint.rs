//! Stage checkpoints: the rows crossing a stage boundary, persisted so the
//! next stage can run in a separate invocation.
//!
//! A checkpoint is a headerless CSV document stored under the producing
//! stage's name. Row order is preserved between write and read.

use std::sync::Arc;
use csv::StringRecord;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};
use crate::interfaces::CheckpointStore;
use crate::observability::metrics::{CHECKPOINT_ROWS_LOADED, CHECKPOINT_ROWS_WRITTEN};
use crate::pipeline::{queue, Stage};
use crate::types::CheckpointRow;

/// Per-type row decoder used when replaying a checkpoint.
pub type Decoder<T> = fn(&StringRecord) -> std::result::Result<T, String>;

/// Drain `input` into one CSV buffer and save it under the stage's name.
pub async fn write_checkpoint<T: CheckpointRow>(
    stage: Stage,
    mut input: mpsc::Receiver<T>,
    store: Arc<dyn CheckpointStore>,
    token: CancellationToken,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    let mut rows = 0u64;

    while let Some(record) = queue::recv(&mut input, &token).await? {
        writer.write_record(record.to_row())?;
        rows += 1;
    }

    let data = writer.into_inner().map_err(|e| Error::Checkpoint {
        stage: stage.to_string(),
        reason: e.to_string(),
    })?;

    queue::cancellable(&token, store.save_stage(stage.as_str(), &data)).await?;
    CHECKPOINT_ROWS_WRITTEN.inc_by(rows as f64);

    tracing::info!(rows, "Checkpoint written");
    Ok(())
}

/// Load the stage's checkpoint and replay its rows into `output`.
///
/// A row that fails to decode aborts the whole load.
pub async fn read_checkpoint<T: Send + 'static>(
    stage: Stage,
    decode: Decoder<T>,
    output: mpsc::Sender<T>,
    store: Arc<dyn CheckpointStore>,
    token: CancellationToken,
) -> Result<()> {
    let result = async {
        let data = queue::cancellable(&token, store.load_stage(stage.as_str())).await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_slice());

        let mut rows = 0u64;
        for (idx, result) in reader.records().enumerate() {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let row = idx + 1;
            let decode_error = |reason: String| Error::CheckpointDecode {
                stage: stage.to_string(),
                row,
                reason,
            };

            let record = result.map_err(|e| decode_error(e.to_string()))?;
            let item = decode(&record).map_err(decode_error)?;

            queue::send(&output, item, &token).await?;
            CHECKPOINT_ROWS_LOADED.inc();
            rows += 1;
        }

        tracing::info!(rows, "Checkpoint loaded");
        Ok::<_, Error>(())
    }
    .await;

    queue::cancel_on_error(&token, result)
}
