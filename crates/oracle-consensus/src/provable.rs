//! Hashable resolution bundle for external verification.
//!
//! `data_hash` is self-referential: it is the SHA-256 of the canonical form of
//! every other field. [`ProvableConsensusData::verify_hash`] recomputes it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consensus::ConsensusResult;
use crate::domain::{
    to_canonical_value, AgentResult, CredibilityTier, Hashable, OracleError, Outcome, Result,
};
use crate::strict::{DisagreementAnalysis, VerificationResult};

const HASH_FIELD: &str = "data_hash";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvableConsensusData {
    pub consensus_reached: bool,
    pub outcome: Outcome,
    pub confidence: f64,
    pub agent_count: usize,
    pub agreement_ratio: f64,
    pub weighted_ratio: f64,
    pub verification: VerificationResult,
    /// Present only when the agents disagreed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disagreement: Option<DisagreementAnalysis>,
    pub total_sources: usize,
    pub unique_sources: usize,
    /// Source occurrences per credibility tier, across all agents.
    pub tier_distribution: BTreeMap<CredibilityTier, usize>,
    pub calculated_at: DateTime<Utc>,
    pub data_hash: String,
}

impl ProvableConsensusData {
    /// Assemble and hash the bundle, stamped with the current time.
    pub fn assemble(
        results: &[AgentResult],
        consensus: &ConsensusResult,
        verification: VerificationResult,
        disagreement: DisagreementAnalysis,
    ) -> Result<Self> {
        Self::assemble_at(results, consensus, verification, disagreement, Utc::now())
    }

    /// [`assemble`](Self::assemble) with a fixed timestamp.
    pub fn assemble_at(
        results: &[AgentResult],
        consensus: &ConsensusResult,
        verification: VerificationResult,
        disagreement: DisagreementAnalysis,
        calculated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut data = Self {
            consensus_reached: consensus.reached,
            outcome: consensus.outcome,
            confidence: consensus.confidence,
            agent_count: consensus.agent_count,
            agreement_ratio: consensus.agreement_ratio,
            weighted_ratio: consensus.weighted_ratio,
            verification,
            disagreement: disagreement.has_disagreement.then_some(disagreement),
            total_sources: consensus.total_sources,
            unique_sources: consensus.unique_sources,
            tier_distribution: tier_distribution(results),
            calculated_at,
            data_hash: String::new(),
        };
        data.refresh_hash()?;
        Ok(data)
    }

    /// Recompute `data_hash` after editing any field.
    pub fn refresh_hash(&mut self) -> Result<()> {
        self.data_hash = self.content_hash()?;
        Ok(())
    }

    /// Check that `data_hash` matches the other fields.
    pub fn verify_hash(&self) -> Result<()> {
        let actual = self.content_hash()?;
        if actual != self.data_hash {
            return Err(OracleError::DigestMismatch {
                expected: self.data_hash.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Whether every agent voted the same way.
    pub fn is_unanimous(&self) -> bool {
        self.disagreement.is_none()
    }
}

impl Hashable for ProvableConsensusData {
    fn canonical_value(&self) -> Result<Value> {
        let mut value = to_canonical_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove(HASH_FIELD);
        }
        Ok(value)
    }
}

/// Count source occurrences per credibility tier. Empty tiers are absent.
pub fn tier_distribution(results: &[AgentResult]) -> BTreeMap<CredibilityTier, usize> {
    let mut dist = BTreeMap::new();
    for source in results.iter().flat_map(|r| &r.sources) {
        *dist.entry(source.tier()).or_insert(0) += 1;
    }
    dist
}
