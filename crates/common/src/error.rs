use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A market, currency or side code with no known mapping.
    #[error("Unknown {kind} '{value}'")]
    UnknownEnumerant { kind: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Error::UnknownEnumerant {
            kind,
            value: value.into(),
        }
    }

    /// Fatal errors mean the process is misconfigured or talking to an exchange
    /// it cannot model. Pipelines stop on them instead of skipping the cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::UnknownEnumerant { .. } | Error::Config(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
