use thiserror::Error;

/// Main error type for Panlink
#[derive(Error, Debug)]
pub enum PanlinkError {
    /// The named-entity recognizer could not be reached or initialised.
    /// Fatal: every non-pattern resolution path depends on it.
    #[error("Recognizer unavailable: {0}")]
    RecognizerUnavailable(String),

    /// Recognizer request or response failure during a run
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document decoding errors
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenient Result type using PanlinkError
pub type Result<T> = std::result::Result<T, PanlinkError>;
