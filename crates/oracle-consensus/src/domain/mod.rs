//! Domain models for the oracle consensus engine.
//!
//! - `AgentResult` / `ResearchSource`: per-agent judgments and evidence
//! - `ConsensusConfig` / `StrictConsensusConfig`: immutable parameter sets
//! - `canonical`: canonical JSON and SHA-256 digests

pub mod canonical;
pub mod config;
pub mod error;
pub mod model;

pub use canonical::{
    canonical_json, compute_digest, hashable, sha256_hex, to_canonical_json, to_canonical_value,
    Hashable,
};
pub use config::{ConsensusConfig, StrictConsensusConfig};
pub use error::{OracleError, Result};
pub use model::{
    read_agent_results, AgentResult, CredibilityTier, Outcome, ResearchSource, SourceCategory,
};
