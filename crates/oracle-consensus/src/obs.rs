//! Structured observability hooks for resolution lifecycle events.
//!
//! The algorithms themselves never log. Callers pass the values they got
//! back to these hooks:
//! - `ResolutionSpan` RAII guard scoping events to one resolution
//! - `emit_*` functions for consensus, verification, disagreement and hashing
//!
//! Events are emitted at `info!` level; hash mismatches at `warn!`.

use tracing::info;

use crate::consensus::ConsensusResult;
use crate::provable::ProvableConsensusData;
use crate::strict::{DisagreementAnalysis, VerificationResult};

/// RAII guard that enters a resolution-scoped tracing span.
///
/// ```
/// use oracle_consensus::obs::ResolutionSpan;
///
/// let _span = ResolutionSpan::enter("market-42");
/// // events emitted here carry resolution_id = "market-42"
/// ```
pub struct ResolutionSpan {
    _span: tracing::span::EnteredSpan,
}

impl ResolutionSpan {
    pub fn enter(resolution_id: &str) -> Self {
        let span = tracing::info_span!("oracle.resolution", resolution_id = %resolution_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_consensus_calculated(consensus: &ConsensusResult) {
    info!(
        event = "consensus.calculated",
        reached = consensus.reached,
        outcome = %consensus.outcome,
        confidence = consensus.confidence,
        agreement_ratio = consensus.agreement_ratio,
        weighted_ratio = consensus.weighted_ratio,
        agent_count = consensus.agent_count,
        requires_human_review = consensus.requires_human_review,
        reason = consensus.reason.as_deref().unwrap_or(""),
    );
}

pub fn emit_verification_completed(verification: &VerificationResult) {
    info!(
        event = "verification.completed",
        passed = verification.passed,
        tier1_sources = verification.tier1_sources,
        tier2_sources = verification.tier2_sources,
        unique_sources = verification.unique_sources,
        cross_verified_facts = verification.cross_verified_facts,
        issues = verification.issues.len(),
        warnings = verification.warnings.len(),
    );
}

pub fn emit_disagreement_analyzed(analysis: &DisagreementAnalysis) {
    info!(
        event = "disagreement.analyzed",
        has_disagreement = analysis.has_disagreement,
        outcomes = analysis.outcome_distribution.len(),
        confidence_spread = analysis.confidence_stats.spread,
        conflicts = analysis.conflicting_evidence.len(),
        requires_manual_review = analysis.requires_manual_review,
    );
}

/// Emit event: provable bundle hashed.
pub fn emit_provable_data_built(data: &ProvableConsensusData) {
    info!(
        event = "provable.built",
        outcome = %data.outcome,
        consensus_reached = data.consensus_reached,
        data_hash = %data.data_hash,
    );
}

/// Emit event: research record sealed.
pub fn emit_research_data_built(market_id: u64, total_agents: usize, sha256_hash: &str) {
    info!(
        event = "research.built",
        market_id = market_id,
        total_agents = total_agents,
        sha256_hash = %sha256_hash,
    );
}

/// Emit event: a recomputed hash did not match (warning level).
pub fn emit_hash_mismatch(expected: &str, actual: &str) {
    tracing::warn!(event = "hash.mismatch", expected = %expected, actual = %actual);
}
