//! Evidence-quality checks beyond vote counting.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{AgentResult, SourceCategory, StrictConsensusConfig};

/// Outcome of the source and cross-citation checks.
///
/// Tier shortfalls are `issues` and fail verification; diversity and
/// cross-verification shortfalls are non-fatal `warnings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub tier1_sources: usize,
    pub tier2_sources: usize,
    /// Source occurrences across all agents.
    pub total_sources: usize,
    /// Distinct URLs across all agents.
    pub unique_sources: usize,
    /// Distinct categories present, sorted by name.
    pub source_categories: Vec<SourceCategory>,
    /// Distinct URLs cited by two or more agents.
    pub cross_verified_facts: usize,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Tier 1: official category, or credibility >= 0.9.
fn is_tier1(category: SourceCategory, credibility: f64) -> bool {
    category == SourceCategory::Official || credibility >= 0.9
}

/// Tier 2: news category, or credibility in [0.7, 0.9).
fn is_tier2(category: SourceCategory, credibility: f64) -> bool {
    category == SourceCategory::News || (0.7..0.9).contains(&credibility)
}

/// Verify evidence over the sources of every agent, winners or not.
pub fn verify(results: &[AgentResult], config: &StrictConsensusConfig) -> VerificationResult {
    let mut tier1 = 0;
    let mut tier2 = 0;
    let mut total = 0;
    let mut categories = BTreeSet::new();
    let mut citing_agents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for result in results {
        for source in &result.sources {
            total += 1;
            if is_tier1(source.category, source.credibility_score) {
                tier1 += 1;
            }
            if is_tier2(source.category, source.credibility_score) {
                tier2 += 1;
            }
            categories.insert(source.category);
            citing_agents
                .entry(source.url.as_str())
                .or_default()
                .insert(result.agent_id.as_str());
        }
    }

    let cross_verified = citing_agents
        .values()
        .filter(|agents| agents.len() >= 2)
        .count();

    let mut issues = Vec::new();
    if tier1 < config.min_tier1_sources {
        issues.push(format!(
            "Insufficient Tier 1 sources: {}/{}",
            tier1, config.min_tier1_sources
        ));
    }
    if tier2 < config.min_tier2_sources {
        issues.push(format!(
            "Insufficient Tier 2 sources: {}/{}",
            tier2, config.min_tier2_sources
        ));
    }

    let mut warnings = Vec::new();
    if config.require_source_diversity && categories.len() < config.min_source_categories {
        warnings.push(format!(
            "Limited source diversity: {}/{} categories",
            categories.len(),
            config.min_source_categories
        ));
    }
    if config.require_cross_verification && cross_verified < config.min_cross_verified_facts {
        warnings.push(format!(
            "Limited cross-verification: {}/{} facts",
            cross_verified, config.min_cross_verified_facts
        ));
    }

    let mut source_categories: Vec<SourceCategory> = categories.into_iter().collect();
    source_categories.sort_by_key(|c| c.as_str());

    VerificationResult {
        passed: issues.is_empty(),
        tier1_sources: tier1,
        tier2_sources: tier2,
        total_sources: total,
        unique_sources: citing_agents.len(),
        source_categories,
        cross_verified_facts: cross_verified,
        issues,
        warnings,
    }
}
