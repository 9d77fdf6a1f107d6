use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Parse Errors
    #[error("Invalid header: expected {expected} fields, found {found}")]
    InvalidHeader {
        expected: usize,
        found: usize,
    },

    #[error("Parse error at row {row}: {reason}")]
    Parse {
        row: usize,
        reason: String,
    },

    #[error("Checkpoint decode failed for stage {stage} at row {row}: {reason}")]
    CheckpointDecode {
        stage: String,
        row: usize,
        reason: String,
    },

    // Conversion Errors
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Unknown event: {0}")]
    UnknownEventKind(String),

    #[error("Price API error: {0}")]
    PriceApi(String),

    // IO Errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Checkpoint error for stage {stage}: {reason}")]
    Checkpoint {
        stage: String,
        reason: String,
    },

    #[error("Sink error: {0}")]
    Sink(String),

    // System Errors
    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Task {0} panicked")]
    TaskPanicked(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// True for errors caused by the run being cancelled rather than by a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub(crate) fn parse(row: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            row,
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
