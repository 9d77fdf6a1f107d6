pub mod queue;
pub mod extractor;
pub mod calculator;
pub mod aggregator;
pub mod inserter;
pub mod checkpoint;

use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use crate::backend::Backend;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::observability::tracing::{trace_checkpoint, trace_stage, trace_worker};
use crate::types::{AggregateRecord, CheckpointRow, ConvertedRecord, RawTransaction};
use crate::utils::task_supervisor::TaskSupervisor;
use self::checkpoint::Decoder;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Extraction,
    Calculation,
    Insertion,
}

impl Stage {
    /// Name of the stage, also the key of the checkpoint holding its output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Calculation => "calculation",
            Stage::Insertion => "insertion",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract → calculate → insert, with each stage independently enabled.
///
/// ## Stage boundaries
/// For each boundary the wiring is fixed before any task starts:
/// - **both stages enabled**: bounded in-memory queue
/// - **only the producer enabled**: the queue is drained into a checkpoint
/// - **only the consumer enabled**: a checkpoint reader feeds the queue
/// - **neither enabled**: nothing
///
/// ## Failure
/// The first failing task cancels the whole run. `run` waits for every task
/// to exit and returns that first error.
pub struct Pipeline {
    backend: Backend,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(backend: Backend, config: PipelineConfig) -> Self {
        Pipeline {
            backend,
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the enabled stages to completion.
    ///
    /// Cancelling `parent` stops the run; it then fails with `Error::Cancelled`.
    pub async fn run(&self, parent: &CancellationToken) -> Result<()> {
        let mut supervisor = TaskSupervisor::new(parent);

        tracing::info!(
            extract = self.config.extract,
            calculate = self.config.calculate,
            insert = self.config.insert,
            workers = self.config.workers,
            "Starting pipeline"
        );

        let transactions = if self.config.extract {
            Some(self.spawn_extraction(&mut supervisor))
        } else {
            None
        };

        let aggregates = if self.config.calculate {
            let input = match transactions {
                Some(rx) => rx,
                None => self.spawn_checkpoint_reader(
                    &mut supervisor,
                    Stage::Extraction,
                    RawTransaction::from_row,
                ),
            };
            Some(self.spawn_calculation(&mut supervisor, input))
        } else {
            if let Some(rx) = transactions {
                self.spawn_checkpoint_writer(&mut supervisor, Stage::Extraction, rx);
            }
            None
        };

        if self.config.insert {
            let input = match aggregates {
                Some(rx) => rx,
                None => self.spawn_checkpoint_reader(
                    &mut supervisor,
                    Stage::Calculation,
                    AggregateRecord::from_row,
                ),
            };
            self.spawn_insertion(&mut supervisor, input);
        } else if let Some(rx) = aggregates {
            self.spawn_checkpoint_writer(&mut supervisor, Stage::Calculation, rx);
        }

        supervisor.wait().await?;

        tracing::info!("Pipeline finished");
        Ok(())
    }

    fn spawn_extraction(&self, supervisor: &mut TaskSupervisor) -> mpsc::Receiver<RawTransaction> {
        let (tx, rx) = queue::bounded();
        let source = Arc::clone(&self.backend.source);
        let token = supervisor.token();

        supervisor.spawn(
            Stage::Extraction.as_str(),
            extractor::run_extraction(source, tx, token).instrument(trace_stage(Stage::Extraction)),
        );

        rx
    }

    /// Calculation workers plus the aggregation fold behind them.
    fn spawn_calculation(
        &self,
        supervisor: &mut TaskSupervisor,
        input: mpsc::Receiver<RawTransaction>,
    ) -> mpsc::Receiver<AggregateRecord> {
        let input: calculator::SharedInput = Arc::new(Mutex::new(input));
        let (converted_tx, converted_rx) = queue::bounded::<ConvertedRecord>();

        for worker in 0..self.config.workers {
            let future = calculator::calculate(
                worker,
                Arc::clone(&input),
                converted_tx.clone(),
                Arc::clone(&self.backend.resolver),
                supervisor.token(),
            );

            supervisor.spawn(
                format!("calculation-worker-{}", worker),
                future.instrument(trace_worker(worker)),
            );
        }
        // The workers hold the only senders now
        drop(converted_tx);

        let (aggregate_tx, aggregate_rx) = queue::bounded();
        let future = aggregator::aggregate(
            converted_rx,
            aggregate_tx,
            self.config.group_by,
            supervisor.token(),
        );
        supervisor.spawn("aggregation", future.instrument(trace_stage(Stage::Calculation)));

        aggregate_rx
    }

    fn spawn_insertion(&self, supervisor: &mut TaskSupervisor, input: mpsc::Receiver<AggregateRecord>) {
        let sink = Arc::clone(&self.backend.sink);
        let token = supervisor.token();

        supervisor.spawn(
            Stage::Insertion.as_str(),
            inserter::insert(input, sink, token).instrument(trace_stage(Stage::Insertion)),
        );
    }

    fn spawn_checkpoint_writer<T: CheckpointRow>(
        &self,
        supervisor: &mut TaskSupervisor,
        stage: Stage,
        input: mpsc::Receiver<T>,
    ) {
        let store = Arc::clone(&self.backend.checkpoints);
        let token = supervisor.token();

        supervisor.spawn(
            format!("{}-checkpoint-writer", stage),
            checkpoint::write_checkpoint(stage, input, store, token)
                .instrument(trace_checkpoint(stage, "write")),
        );
    }

    fn spawn_checkpoint_reader<T: Send + 'static>(
        &self,
        supervisor: &mut TaskSupervisor,
        stage: Stage,
        decode: Decoder<T>,
    ) -> mpsc::Receiver<T> {
        let (tx, rx) = queue::bounded();
        let store = Arc::clone(&self.backend.checkpoints);
        let token = supervisor.token();

        supervisor.spawn(
            format!("{}-checkpoint-reader", stage),
            checkpoint::read_checkpoint(stage, decode, tx, store, token)
                .instrument(trace_checkpoint(stage, "read")),
        );

        rx
    }
}
