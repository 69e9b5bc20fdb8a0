use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

/// Failure taxonomy for the conversion pipeline. Every variant is fatal for
/// the run that raised it; nothing in this crate retries internally.
#[derive(Debug, Error)]
pub enum ImporterError {
    #[error("not a supported flow: \"{0}\"")]
    UnsupportedFlow(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("malformed row {index}: expected {expected} columns, found {found}")]
    MalformedRow {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown specific: \"{0}\"")]
    UnknownSpecific(String),

    #[error("import failed: {0}")]
    Import(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl From<reqwest::Error> for ImporterError {
    fn from(err: reqwest::Error) -> Self {
        ImporterError::Import(err.to_string())
    }
}
