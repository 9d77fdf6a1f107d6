use csv::StringRecord;
use crate::types::{field, CheckpointRow};

/// Daily volume of one bucket, ready for the warehouse.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRecord {
    pub date: String,
    pub project_id: String,
    pub tx_count: u64,
    pub total_usd: f64,
}

impl CheckpointRow for AggregateRecord {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.project_id.clone(),
            self.tx_count.to_string(),
            // f64 Display is the shortest string that parses back to the same value
            self.total_usd.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> std::result::Result<Self, String> {
        let tx_count = field(row, 2)?
            .parse::<u64>()
            .map_err(|_| "parsing num txs".to_string())?;

        let total_usd = field(row, 3)?
            .parse::<f64>()
            .map_err(|_| "parsing total volume".to_string())?;

        Ok(AggregateRecord {
            date: field(row, 0)?.to_string(),
            project_id: field(row, 1)?.to_string(),
            tx_count,
            total_usd,
        })
    }
}
