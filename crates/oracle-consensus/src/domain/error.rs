//! Domain-level error taxonomy for the oracle consensus engine.
//!
//! Only programming and input-contract failures live here. Insufficient
//! participation, missing supermajority, thin evidence and disagreement are
//! reported as values on the returned structs, never as errors.

/// Oracle domain errors.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("value cannot be canonicalized: {0}")]
    NonCanonical(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("invalid consensus config: {0}")]
    InvalidConfig(String),

    #[error("invalid agent result: {0}")]
    InvalidAgentResult(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for oracle domain operations.
pub type Result<T> = std::result::Result<T, OracleError>;
