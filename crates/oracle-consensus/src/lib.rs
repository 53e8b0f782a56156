//! Oracle Consensus Engine
//!
//! Aggregates independent agent judgments about a yes/no question into one
//! auditable resolution and seals it into canonical, hashable records.
//!
//! Entry points: [`calculate`], [`calculate_strict`], [`merge_sources`] and
//! [`ResearchDataBuilder::build`]. Every record implements [`Hashable`] for
//! its `(canonical_json, sha256)` pair.

pub mod consensus;
pub mod domain;
pub mod obs;
pub mod provable;
pub mod reporting;
pub mod research;
pub mod strict;
pub mod telemetry;

pub use consensus::{
    calculate, merge_sources, source_overlap, source_quality, vote_weight, ConsensusResult,
};

pub use domain::{
    canonical_json, compute_digest, hashable, read_agent_results, sha256_hex, to_canonical_json,
    to_canonical_value, AgentResult, ConsensusConfig, CredibilityTier, Hashable, OracleError,
    Outcome, ResearchSource, Result, SourceCategory, StrictConsensusConfig,
};

pub use provable::{tier_distribution, ProvableConsensusData};

pub use research::{
    verify_payload, OracleConfigData, OracleResearchData, PayloadVerification, ProcessRecords,
    ResearchDataBuilder, ResearchDataEntry, SealedRecord,
};

pub use strict::{
    amend, analyze, calculate_strict, verify, ConfidenceStats, ConflictRecord,
    DisagreementAnalysis, VerificationResult,
};

pub use reporting::{render_consensus_summary_md, write_consensus_summary_md, write_sealed_json};

pub use telemetry::init_tracing;

/// Crate version, stamped into CLI output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
