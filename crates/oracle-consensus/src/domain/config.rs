//! Consensus parameter sets.
//!
//! [`StrictConsensusConfig`] embeds a [`ConsensusConfig`] and derefs to it, so
//! `strict.threshold` reads the shared base field.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::error::{OracleError, Result};

/// Parameters of the weighted vote aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Minimum number of agents (total and valid) required.
    pub min_agents: usize,
    /// Supermajority fraction in [0.5, 1.0]; 0.67 is a 2/3 majority.
    pub threshold: f64,
    /// Minimum confidence for a result to be considered trustworthy.
    pub min_confidence: f64,
    /// Compare the weighted ratio (true) or the raw head-count ratio (false).
    pub use_weighted_voting: bool,
    /// Sources an agent must cite for its vote to be valid.
    pub min_sources_per_agent: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_agents: 3,
            threshold: 0.67,
            min_confidence: 0.5,
            use_weighted_voting: true,
            min_sources_per_agent: 50,
        }
    }
}

impl ConsensusConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_min_agents(mut self, min_agents: usize) -> Self {
        self.min_agents = min_agents;
        self
    }

    pub fn with_weighted_voting(mut self, enabled: bool) -> Self {
        self.use_weighted_voting = enabled;
        self
    }

    pub fn with_min_sources_per_agent(mut self, min_sources: usize) -> Self {
        self.min_sources_per_agent = min_sources;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_agents == 0 {
            return Err(OracleError::InvalidConfig(
                "min_agents must be at least 1".to_string(),
            ));
        }
        if !(0.5..=1.0).contains(&self.threshold) {
            return Err(OracleError::InvalidConfig(format!(
                "threshold {} outside [0.5, 1.0]",
                self.threshold
            )));
        }
        check_unit("min_confidence", self.min_confidence)
    }
}

/// Strict-mode parameters: the base aggregator config plus evidence bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictConsensusConfig {
    #[serde(flatten)]
    pub base: ConsensusConfig,
    /// Minimum tier 1 (official/wire) source citations.
    pub min_tier1_sources: usize,
    /// Minimum tier 2 (major news) source citations.
    pub min_tier2_sources: usize,
    pub require_source_diversity: bool,
    pub min_source_categories: usize,
    /// Agents below this confidence do not vote in strict mode.
    pub min_individual_confidence: f64,
    /// A reached consensus below this mean confidence is downgraded.
    pub min_consensus_confidence: f64,
    pub require_cross_verification: bool,
    /// Minimum URLs cited by two or more agents.
    pub min_cross_verified_facts: usize,
    /// Confidence spread above which human review is required.
    pub max_confidence_spread: f64,
}

impl Default for StrictConsensusConfig {
    fn default() -> Self {
        Self {
            base: ConsensusConfig::default(),
            min_tier1_sources: 2,
            min_tier2_sources: 3,
            require_source_diversity: true,
            min_source_categories: 3,
            min_individual_confidence: 0.6,
            min_consensus_confidence: 0.7,
            require_cross_verification: true,
            min_cross_verified_facts: 3,
            max_confidence_spread: 0.3,
        }
    }
}

impl Deref for StrictConsensusConfig {
    type Target = ConsensusConfig;

    fn deref(&self) -> &ConsensusConfig {
        &self.base
    }
}

impl StrictConsensusConfig {
    pub fn new(base: ConsensusConfig) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// Defaults overridden by `ORACLE_THRESHOLD`, `ORACLE_MIN_AGENTS`,
    /// `ORACLE_MIN_SOURCES_PER_AGENT` and `ORACLE_WEIGHTED_VOTING`.
    ///
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("ORACLE_THRESHOLD") {
            config.base.threshold = v;
        }
        if let Some(v) = env_parse("ORACLE_MIN_AGENTS") {
            config.base.min_agents = v;
        }
        if let Some(v) = env_parse("ORACLE_MIN_SOURCES_PER_AGENT") {
            config.base.min_sources_per_agent = v;
        }
        if let Some(v) = env_parse("ORACLE_WEIGHTED_VOTING") {
            config.base.use_weighted_voting = v;
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        check_unit("min_individual_confidence", self.min_individual_confidence)?;
        check_unit("min_consensus_confidence", self.min_consensus_confidence)?;
        if !self.max_confidence_spread.is_finite() || self.max_confidence_spread < 0.0 {
            return Err(OracleError::InvalidConfig(format!(
                "max_confidence_spread {} must be a non-negative number",
                self.max_confidence_spread
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn check_unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(OracleError::InvalidConfig(format!(
            "{field} {value} outside [0, 1]"
        )))
    }
}
