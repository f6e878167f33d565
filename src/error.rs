use thiserror::Error;

/// A source failed to produce candidates. Never fatal to the run; the
/// orchestrator records it and continues with the remaining sources.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse failed: {0}")]
    Parse(String),

    #[error("source timed out after {0}s")]
    Timeout(u64),
}

/// A single candidate could not be normalized. The candidate is dropped
/// and counted in the run report; sibling candidates are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no valid calendar date in '{0}'")]
    InvalidDate(String),

    #[error("title too short: '{0}'")]
    TitleTooShort(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl NormalizeError {
    /// Stable label used to bucket rejections in the run report.
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizeError::InvalidDate(_) => "invalid-date",
            NormalizeError::TitleTooShort(_) => "title-too-short",
            NormalizeError::MissingField(_) => "missing-field",
        }
    }
}

/// Store failures are fatal: without a trustworthy snapshot reconciliation
/// cannot proceed, and without a successful write the run's work is lost
/// (but the prior store contents remain valid).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    ReadFailed(String),

    #[error("store write failed: {0}")]
    WriteFailed(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
