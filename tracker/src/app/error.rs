use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// A provider fetch failed or answered with a non-success status
    #[error("data unavailable: {0}")]
    DataUnavailable(String),
    /// A single alert record could not be parsed; never surfaced past the processor
    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}

impl TrackerError {
    pub fn unavailable(source: &anyhow::Error) -> Self {
        Self::DataUnavailable(format!("{:#}", source))
    }
}
