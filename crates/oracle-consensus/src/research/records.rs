//! Externally persisted resolution records and their sealed form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::consensus::ConsensusResult;
use crate::domain::{
    canonical_json, sha256_hex, AgentResult, Hashable, OracleError, Outcome, ResearchSource,
    Result, StrictConsensusConfig,
};
use crate::provable::ProvableConsensusData;
use crate::research::process::ProcessRecords;

pub const ORACLE_CONFIG_VERSION: &str = "1.0.0";
pub const RESEARCH_DATA_VERSION: &str = "2.0.0";

/// Oracle configuration, stored ahead of research and referenced by hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfigData {
    pub version: String,
    pub market_id: u64,
    pub question: String,
    pub resolution_criteria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub created_at: DateTime<Utc>,
    pub agent_count: usize,
    pub agent_strategies: Vec<String>,
    pub consensus_threshold: f64,
    pub min_sources_per_agent: usize,
    pub min_source_categories: usize,
    pub require_tier1_sources: bool,
    pub min_tier1_count: usize,
    pub min_tier2_count: usize,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OracleConfigData {
    /// Describe a resolution run by `config` with one agent per strategy.
    pub fn from_strict(
        market_id: u64,
        question: impl Into<String>,
        resolution_criteria: impl Into<String>,
        strategies: Vec<String>,
        config: &StrictConsensusConfig,
    ) -> Self {
        Self {
            version: ORACLE_CONFIG_VERSION.to_string(),
            market_id,
            question: question.into(),
            resolution_criteria: resolution_criteria.into(),
            deadline: None,
            created_at: Utc::now(),
            agent_count: strategies.len(),
            agent_strategies: strategies,
            consensus_threshold: config.threshold,
            min_sources_per_agent: config.min_sources_per_agent,
            min_source_categories: config.min_source_categories,
            require_tier1_sources: config.min_tier1_sources > 0,
            min_tier1_count: config.min_tier1_sources,
            min_tier2_count: config.min_tier2_sources,
            metadata: Map::new(),
        }
    }
}

impl Hashable for OracleConfigData {}

/// One agent's contribution to the research record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchDataEntry {
    pub agent_id: String,
    pub model: String,
    pub strategy: String,
    pub outcome: Outcome,
    pub confidence: f64,
    pub reasoning: String,
    pub sources: Vec<ResearchSource>,
    pub source_count: usize,
    #[serde(flatten)]
    pub records: ProcessRecords,
    pub research_duration_seconds: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchDataEntry {
    pub fn new(result: &AgentResult, records: ProcessRecords) -> Self {
        Self {
            agent_id: result.agent_id.clone(),
            model: result.model.clone(),
            strategy: result.strategy.clone(),
            outcome: result.outcome,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
            sources: result.sources.clone(),
            source_count: result.source_count(),
            records,
            research_duration_seconds: result.research_duration_seconds,
            timestamp: result.timestamp,
            error: result.error.clone(),
        }
    }
}

impl Hashable for ResearchDataEntry {}

/// The full research record of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResearchData {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_config_cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_config_hash: Option<String>,
    pub market_id: u64,
    pub question: String,
    pub resolution_criteria: String,
    pub research_started_at: DateTime<Utc>,
    pub research_completed_at: DateTime<Utc>,
    pub agent_results: Vec<ResearchDataEntry>,
    pub consensus: ConsensusResult,
    pub merged_sources: Vec<ResearchSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provable_data: Option<ProvableConsensusData>,
    pub total_agents: usize,
    pub valid_agents: usize,
    pub total_sources: usize,
    pub unique_sources: usize,
}

impl Hashable for OracleResearchData {}

/// A record together with its canonical JSON and SHA-256.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedRecord<T> {
    pub data: T,
    pub canonical_json: String,
    pub sha256_hash: String,
}

impl<T> SealedRecord<T> {
    pub fn canonical_bytes(&self) -> &[u8] {
        self.canonical_json.as_bytes()
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Hashable> SealedRecord<T> {
    pub fn seal(data: T) -> Result<Self> {
        let (canonical_json, sha256_hash) = data.hash_data()?;
        Ok(Self {
            data,
            canonical_json,
            sha256_hash,
        })
    }

    /// Recompute the canonical form of `data` and compare hashes.
    pub fn verify(&self) -> Result<()> {
        let actual = self.data.content_hash()?;
        if actual != self.sha256_hash {
            return Err(OracleError::DigestMismatch {
                expected: self.sha256_hash.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Result of checking a stored payload against an expected hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadVerification {
    pub valid: bool,
    pub actual_hash: String,
}

/// Canonicalize arbitrary JSON text and compare its hash with `expected_hash`.
///
/// Unparsable text is an error; a mismatch is reported as `valid: false`.
pub fn verify_payload(json_text: &str, expected_hash: &str) -> Result<PayloadVerification> {
    let parsed: Value = serde_json::from_str(json_text)?;
    let actual_hash = sha256_hex(canonical_json(&parsed)?.as_bytes());
    Ok(PayloadVerification {
        valid: actual_hash.eq_ignore_ascii_case(expected_hash.trim()),
        actual_hash,
    })
}
