use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::config::GroupBy;
use crate::error::Result;
use crate::pipeline::queue;
use crate::types::{AggregateRecord, ConvertedRecord};

#[derive(Debug)]
struct Bucket {
    date: String,
    project_id: String,
    tx_count: u64,
    total_usd: f64,
}

/// Fold of converted records into daily buckets.
///
/// Owned by a single task, so the bucket map needs no locking.
#[derive(Debug)]
pub struct DailyVolume {
    group_by: GroupBy,
    buckets: HashMap<(String, Option<String>), Bucket>,
}

impl DailyVolume {
    pub fn new(group_by: GroupBy) -> Self {
        DailyVolume {
            group_by,
            buckets: HashMap::new(),
        }
    }

    pub fn fold(&mut self, record: ConvertedRecord) {
        let key = match self.group_by {
            GroupBy::Date => (record.date.clone(), None),
            GroupBy::DateAndProject => (record.date.clone(), Some(record.project_id.clone())),
        };

        let bucket = self.buckets.entry(key).or_insert_with(|| Bucket {
            date: record.date,
            project_id: String::new(),
            tx_count: 0,
            total_usd: 0.0,
        });

        bucket.tx_count += 1;
        bucket.total_usd += record.usd_amount;
        // Last record wins when several projects share a date bucket
        bucket.project_id = record.project_id;
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// One aggregate per bucket, in no particular order.
    pub fn into_records(self) -> Vec<AggregateRecord> {
        self.buckets
            .into_values()
            .map(|bucket| AggregateRecord {
                date: bucket.date,
                project_id: bucket.project_id,
                tx_count: bucket.tx_count,
                total_usd: bucket.total_usd,
            })
            .collect()
    }
}

/// Drain `input`, then emit one aggregate per bucket and close `output`.
pub async fn aggregate(
    mut input: mpsc::Receiver<ConvertedRecord>,
    output: mpsc::Sender<AggregateRecord>,
    group_by: GroupBy,
    token: CancellationToken,
) -> Result<()> {
    let mut volume = DailyVolume::new(group_by);

    while let Some(record) = queue::recv(&mut input, &token).await? {
        volume.fold(record);
    }

    tracing::info!(buckets = volume.len(), "Aggregation finished");

    for record in volume.into_records() {
        queue::send(&output, record, &token).await?;
    }

    Ok(())
}
