use std::fmt;
use std::str::FromStr;
use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::Deserialize;
use crate::error::{Error, Result};
use crate::types::{field, CheckpointRow};

/// Number of fields in every row of the raw transaction log, header included.
pub const INPUT_FIELD_COUNT: usize = 16;

/// Layout of the event timestamp, millisecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Day granularity used to bucket transactions.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Positions of the fields we read from a raw log row
const TIMESTAMP_FIELD: usize = 1;
const EVENT_FIELD: usize = 2;
const PROJECT_FIELD: usize = 3;
const PROPS_FIELD: usize = 14;
const NUMS_FIELD: usize = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Buy,
    Sell,
}

impl EventKind {
    pub const BUY: &'static str = "BUY_ITEMS";
    pub const SELL: &'static str = "SELL_ITEMS";

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Buy => Self::BUY,
            EventKind::Sell => Self::SELL,
        }
    }

    /// Sign applied to the USD value of a transaction of this kind.
    pub fn sign(&self) -> f64 {
        match self {
            EventKind::Buy => 1.0,
            EventKind::Sell => -1.0,
        }
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            Self::BUY => Ok(EventKind::Buy),
            Self::SELL => Ok(EventKind::Sell),
            other => Err(Error::UnknownEventKind(other.to_string())),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized marketplace transaction.
///
/// The event is kept as read from the log. Whether it is a known kind is
/// decided when the transaction is converted, not when it is parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTransaction {
    pub timestamp: NaiveDateTime,
    pub event: String,
    pub project_id: String,
    pub currency_symbol: String,
    pub currency_amount: f64,
}

#[derive(Deserialize)]
struct PropsFragment {
    #[serde(rename = "currencySymbol", default)]
    currency_symbol: String,
}

#[derive(Deserialize)]
struct NumsFragment {
    #[serde(rename = "currencyValueDecimal", default)]
    currency_value_decimal: String,
}

impl RawTransaction {
    /// Normalize one row of the raw transaction log.
    pub fn from_source_row(row: &StringRecord) -> std::result::Result<Self, String> {
        if row.len() != INPUT_FIELD_COUNT {
            return Err(format!(
                "expected {} fields, found {}",
                INPUT_FIELD_COUNT,
                row.len()
            ));
        }

        let timestamp = parse_timestamp(field(row, TIMESTAMP_FIELD)?)?;

        let props: PropsFragment = serde_json::from_str(field(row, PROPS_FIELD)?)
            .map_err(|e| format!("parsing currency symbol: {}", e))?;

        let nums: NumsFragment = serde_json::from_str(field(row, NUMS_FIELD)?)
            .map_err(|e| format!("parsing currency value decimal: {}", e))?;

        let currency_amount = parse_amount(&nums.currency_value_decimal)?;

        Ok(RawTransaction {
            timestamp,
            event: field(row, EVENT_FIELD)?.to_string(),
            project_id: field(row, PROJECT_FIELD)?.to_string(),
            currency_symbol: props.currency_symbol,
            currency_amount,
        })
    }

    pub fn event_kind(&self) -> Result<EventKind> {
        self.event.parse()
    }

    /// Calendar day of the transaction, e.g. `2024-04-15`.
    pub fn date(&self) -> String {
        self.timestamp.format(DATE_FORMAT).to_string()
    }
}

impl CheckpointRow for RawTransaction {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.event.clone(),
            self.project_id.clone(),
            self.currency_symbol.clone(),
            self.currency_amount.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> std::result::Result<Self, String> {
        Ok(RawTransaction {
            timestamp: parse_timestamp(field(row, 0)?)?,
            event: field(row, 1)?.to_string(),
            project_id: field(row, 2)?.to_string(),
            currency_symbol: field(row, 3)?.to_string(),
            currency_amount: parse_amount(field(row, 4)?)?,
        })
    }
}

/// Length of `YYYY-MM-DD HH:MM:SS.mmm`.
const TIMESTAMP_LEN: usize = 23;

fn parse_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    // chrono accepts a missing `%.3f` fraction, the log layout does not
    if raw.len() != TIMESTAMP_LEN || raw.as_bytes()[TIMESTAMP_LEN - 4] != b'.' {
        return Err(format!("parsing time {:?}: expected millisecond precision", raw));
    }

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| format!("parsing time {:?}: {}", raw, e))
}

fn parse_amount(raw: &str) -> std::result::Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("parsing currency value decimal {:?}", raw))
}
