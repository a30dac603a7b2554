use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("page {page} could not be decoded: {detail}")]
    Extraction { page: u32, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("History log error: {0}")]
    History(String),

    #[error("{count} unacknowledged threshold alarm(s); pass --acknowledge-alarms to allow a destructive overwrite")]
    UnacknowledgedAlarms { count: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
