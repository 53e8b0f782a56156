//! Accumulates per-resolution state and emits the sealed research record.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::consensus::ConsensusResult;
use crate::domain::{
    AgentResult, Hashable, ResearchSource, Result, StrictConsensusConfig,
};
use crate::provable::ProvableConsensusData;
use crate::research::process::ProcessRecords;
use crate::research::records::{
    OracleConfigData, OracleResearchData, ResearchDataEntry, SealedRecord, RESEARCH_DATA_VERSION,
};

const CONSENSUS_NOT_CALCULATED: &str = "consensus not calculated";

/// Builder for [`OracleResearchData`].
///
/// ```
/// use oracle_consensus::research::ResearchDataBuilder;
///
/// let mut builder = ResearchDataBuilder::new(7, "Will it rain?", "Weather service report");
/// builder.start_research();
/// let sealed = builder.build().unwrap();
/// assert_eq!(sealed.data.total_agents, 0);
/// assert_eq!(sealed.sha256_hash.len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct ResearchDataBuilder {
    market_id: u64,
    question: String,
    resolution_criteria: String,
    deadline: Option<String>,
    min_sources_per_agent: usize,
    research_started_at: Option<DateTime<Utc>>,
    research_completed_at: Option<DateTime<Utc>>,
    agent_results: Vec<AgentResult>,
    records: HashMap<String, ProcessRecords>,
    consensus: Option<ConsensusResult>,
    provable_data: Option<ProvableConsensusData>,
    merged_sources: Vec<ResearchSource>,
    oracle_config: Option<OracleConfigData>,
    oracle_config_cid: Option<String>,
    oracle_config_hash: Option<String>,
}

impl ResearchDataBuilder {
    pub fn new(
        market_id: u64,
        question: impl Into<String>,
        resolution_criteria: impl Into<String>,
    ) -> Self {
        Self {
            market_id,
            question: question.into(),
            resolution_criteria: resolution_criteria.into(),
            deadline: None,
            min_sources_per_agent: StrictConsensusConfig::default().min_sources_per_agent,
            research_started_at: None,
            research_completed_at: None,
            agent_results: Vec::new(),
            records: HashMap::new(),
            consensus: None,
            provable_data: None,
            merged_sources: Vec::new(),
            oracle_config: None,
            oracle_config_cid: None,
            oracle_config_hash: None,
        }
    }

    pub fn deadline(&mut self, deadline: impl Into<String>) -> &mut Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Source minimum used to count `valid_agents`.
    pub fn min_sources_per_agent(&mut self, min_sources: usize) -> &mut Self {
        self.min_sources_per_agent = min_sources;
        self
    }

    pub fn start_research(&mut self) -> &mut Self {
        self.start_research_at(Utc::now())
    }

    pub fn start_research_at(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.research_started_at = Some(at);
        self
    }

    /// Record an agent's result with its optional audit trails.
    pub fn add_agent_result(
        &mut self,
        result: AgentResult,
        records: Option<ProcessRecords>,
    ) -> &mut Self {
        if let Some(records) = records {
            self.records.insert(result.agent_id.clone(), records);
        }
        self.agent_results.push(result);
        self
    }

    pub fn set_consensus(
        &mut self,
        consensus: ConsensusResult,
        provable_data: Option<ProvableConsensusData>,
    ) -> &mut Self {
        self.consensus = Some(consensus);
        self.provable_data = provable_data;
        self
    }

    pub fn set_merged_sources(&mut self, sources: Vec<ResearchSource>) -> &mut Self {
        self.merged_sources = sources;
        self
    }

    /// Reference an oracle config stored elsewhere, optionally by its content id.
    pub fn set_oracle_config(
        &mut self,
        config: OracleConfigData,
        cid: Option<String>,
    ) -> Result<&mut Self> {
        self.oracle_config_hash = Some(config.content_hash()?);
        self.oracle_config = Some(config);
        self.oracle_config_cid = cid;
        Ok(self)
    }

    /// Derive the oracle config from `config` and reference it.
    pub fn build_config(
        &mut self,
        strategies: Vec<String>,
        config: &StrictConsensusConfig,
    ) -> Result<SealedRecord<OracleConfigData>> {
        let mut data = OracleConfigData::from_strict(
            self.market_id,
            self.question.clone(),
            self.resolution_criteria.clone(),
            strategies,
            config,
        );
        data.deadline = self.deadline.clone();
        let sealed = SealedRecord::seal(data)?;
        self.oracle_config_hash = Some(sealed.sha256_hash.clone());
        self.oracle_config = Some(sealed.data.clone());
        Ok(sealed)
    }

    pub fn complete_research(&mut self) -> &mut Self {
        self.complete_research_at(Utc::now())
    }

    pub fn complete_research_at(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.research_completed_at = Some(at);
        self
    }

    pub fn agent_count(&self) -> usize {
        self.agent_results.len()
    }

    pub fn has_consensus(&self) -> bool {
        self.consensus.is_some()
    }

    /// Completed, with at least one agent and a consensus.
    pub fn is_complete(&self) -> bool {
        self.research_completed_at.is_some()
            && !self.agent_results.is_empty()
            && self.consensus.is_some()
    }

    pub fn oracle_config(&self) -> Option<&OracleConfigData> {
        self.oracle_config.as_ref()
    }

    /// Build and seal the research record.
    ///
    /// Missing start and completion times are set to now and kept, so
    /// building unchanged state twice gives identical bytes.
    pub fn build(&mut self) -> Result<SealedRecord<OracleResearchData>> {
        let now = Utc::now();
        let started_at = *self.research_started_at.get_or_insert(now);
        let completed_at = *self.research_completed_at.get_or_insert(now);

        let agent_results = self
            .agent_results
            .iter()
            .map(|r| {
                let records = self.records.get(&r.agent_id).cloned().unwrap_or_default();
                ResearchDataEntry::new(r, records)
            })
            .collect();

        let consensus = self.consensus.clone().unwrap_or_else(|| {
            ConsensusResult::undetermined(self.agent_results.len(), CONSENSUS_NOT_CALCULATED)
        });

        let unique_urls: BTreeSet<&str> = self
            .agent_results
            .iter()
            .flat_map(|r| r.sources.iter().map(|s| s.url.as_str()))
            .collect();

        let data = OracleResearchData {
            version: RESEARCH_DATA_VERSION.to_string(),
            oracle_config_cid: self.oracle_config_cid.clone(),
            oracle_config_hash: self.oracle_config_hash.clone(),
            market_id: self.market_id,
            question: self.question.clone(),
            resolution_criteria: self.resolution_criteria.clone(),
            research_started_at: started_at,
            research_completed_at: completed_at,
            agent_results,
            consensus,
            merged_sources: self.merged_sources.clone(),
            provable_data: self.provable_data.clone(),
            total_agents: self.agent_results.len(),
            valid_agents: self
                .agent_results
                .iter()
                .filter(|r| r.is_valid(self.min_sources_per_agent))
                .count(),
            total_sources: self.agent_results.iter().map(|r| r.sources.len()).sum(),
            unique_sources: unique_urls.len(),
        };

        SealedRecord::seal(data)
    }
}
