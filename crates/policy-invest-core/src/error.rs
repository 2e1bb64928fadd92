use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyInvestError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Non-finite value in {context}")]
    NonFinite { context: String },

    #[error("Cash flows have no sign change; IRR is undefined")]
    NoSignChange,

    #[error("Could not bracket a root after {attempts} expansion attempts")]
    BracketNotFound { attempts: u32 },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PolicyInvestError {
    fn from(e: serde_json::Error) -> Self {
        PolicyInvestError::SerializationError(e.to_string())
    }
}
