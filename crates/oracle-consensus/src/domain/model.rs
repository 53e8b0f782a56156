//! Agent judgments and the evidence they cite.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{OracleError, Result};

/// Resolution outcome of a yes/no question.
///
/// Declaration order is the tie-break priority used by the vote aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Yes,
    No,
    Undetermined,
    /// A failed or non-participating agent.
    Invalid,
}

impl Outcome {
    /// Outcomes a valid agent can vote for, in tie-break priority order.
    pub const VOTABLE: [Outcome; 3] = [Outcome::Yes, Outcome::No, Outcome::Undetermined];

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Yes => "YES",
            Outcome::No => "NO",
            Outcome::Undetermined => "UNDETERMINED",
            Outcome::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad category of a research source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Government sites, company websites, press releases.
    Official,
    /// Wire services and major outlets.
    News,
    Social,
    DomainSpecific,
    FactCheck,
}

impl SourceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceCategory::Official => "official",
            SourceCategory::News => "news",
            SourceCategory::Social => "social",
            SourceCategory::DomainSpecific => "domain_specific",
            SourceCategory::FactCheck => "fact_check",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse credibility bucket derived from a credibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CredibilityTier {
    /// Official and wire sources, score >= 0.9.
    #[serde(rename = "tier_1")]
    Tier1,
    /// Major news, score >= 0.7.
    #[serde(rename = "tier_2")]
    Tier2,
    /// Industry publications, score >= 0.5.
    #[serde(rename = "tier_3")]
    Tier3,
    /// Blogs, social and unknown sources.
    #[serde(rename = "tier_4_5")]
    Tier4And5,
}

impl CredibilityTier {
    pub fn from_score(credibility: f64) -> Self {
        if credibility >= 0.9 {
            CredibilityTier::Tier1
        } else if credibility >= 0.7 {
            CredibilityTier::Tier2
        } else if credibility >= 0.5 {
            CredibilityTier::Tier3
        } else {
            CredibilityTier::Tier4And5
        }
    }
}

fn default_score() -> f64 {
    0.8
}

/// A single piece of cited evidence. Identity is the `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSource {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    /// Publication date as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub category: SourceCategory,
    #[serde(default = "default_score")]
    pub relevance_score: f64,
    #[serde(default = "default_score")]
    pub credibility_score: f64,
    /// Agents citing this source. Deduplicated, append-only across merges.
    #[serde(default)]
    pub cited_by: Vec<String>,
}

impl ResearchSource {
    pub fn new(url: impl Into<String>, title: impl Into<String>, category: SourceCategory) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: String::new(),
            date: None,
            category,
            relevance_score: default_score(),
            credibility_score: default_score(),
            cited_by: Vec::new(),
        }
    }

    pub fn with_scores(mut self, relevance: f64, credibility: f64) -> Self {
        self.relevance_score = relevance;
        self.credibility_score = credibility;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Ranking key used when merging: relevance x credibility.
    pub fn quality(&self) -> f64 {
        self.relevance_score * self.credibility_score
    }

    /// Record that `agent_id` cites this source. No-op when already present.
    pub fn add_citation(&mut self, agent_id: &str) {
        if !self.cited_by.iter().any(|a| a == agent_id) {
            self.cited_by.push(agent_id.to_string());
        }
    }

    pub fn tier(&self) -> CredibilityTier {
        CredibilityTier::from_score(self.credibility_score)
    }
}

impl PartialEq for ResearchSource {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ResearchSource {}

impl std::hash::Hash for ResearchSource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

fn default_strategy() -> String {
    "comprehensive".to_string()
}

/// One agent's judgment about the question.
///
/// Produced once per agent per resolution attempt and treated as immutable
/// input by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: String,
    /// Model used by the agent.
    pub model: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    pub outcome: Outcome,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub sources: Vec<ResearchSource>,
    #[serde(default)]
    pub research_duration_seconds: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn new(
        agent_id: impl Into<String>,
        model: impl Into<String>,
        outcome: Outcome,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            model: model.into(),
            strategy: default_strategy(),
            outcome,
            confidence,
            reasoning: reasoning.into(),
            sources: Vec::new(),
            research_duration_seconds: 0.0,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<ResearchSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether this result may vote: enough sources, no error, not `INVALID`.
    pub fn is_valid(&self, min_sources_per_agent: usize) -> bool {
        self.sources.len() >= min_sources_per_agent
            && self.error.is_none()
            && self.outcome != Outcome::Invalid
    }

    /// Number of cited sources per category.
    pub fn category_distribution(&self) -> BTreeMap<SourceCategory, usize> {
        let mut dist = BTreeMap::new();
        for source in &self.sources {
            *dist.entry(source.category).or_insert(0) += 1;
        }
        dist
    }

    /// Check score ranges. Scores outside [0, 1] or non-finite are rejected.
    pub fn validate(&self) -> Result<()> {
        check_unit(&self.agent_id, "confidence", self.confidence)?;
        for source in &self.sources {
            check_unit(&self.agent_id, "relevance_score", source.relevance_score)?;
            check_unit(&self.agent_id, "credibility_score", source.credibility_score)?;
        }
        if !self.research_duration_seconds.is_finite() || self.research_duration_seconds < 0.0 {
            return Err(OracleError::InvalidAgentResult(format!(
                "{}: research_duration_seconds {} must be a non-negative number",
                self.agent_id, self.research_duration_seconds
            )));
        }
        Ok(())
    }
}

/// Read a JSON array of agent results from `path` and validate each one.
pub fn read_agent_results(path: &Path) -> Result<Vec<AgentResult>> {
    let text = std::fs::read_to_string(path)?;
    let results: Vec<AgentResult> = serde_json::from_str(&text)?;
    for result in &results {
        result.validate()?;
    }
    Ok(results)
}

fn check_unit(agent_id: &str, field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(OracleError::InvalidAgentResult(format!(
            "{agent_id}: {field} {value} outside [0, 1]"
        )))
    }
}
