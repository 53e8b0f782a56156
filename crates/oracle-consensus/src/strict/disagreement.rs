//! Characterisation of agent disagreement.
//!
//! The analyzer always sees every vote, including invalid and low-confidence
//! ones, so the record reflects the full spread of opinion.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::consensus::{ordered_sum, source_overlap};
use crate::domain::{AgentResult, Outcome, StrictConsensusConfig};

/// Shared sources listed per conflict record.
const MAX_SHARED_SOURCES: usize = 5;
/// Mean confidence under which an undisputed result still gets a recommendation.
const LOW_MEAN_CONFIDENCE: f64 = 0.7;
/// Conflict records beyond which manual review is required.
const MAX_CONFLICTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// `max - min`.
    pub spread: f64,
}

impl ConfidenceStats {
    /// Statistics over `confidences`; all zero when empty.
    pub fn from_values(confidences: &[f64]) -> Self {
        if confidences.is_empty() {
            return Self::default();
        }
        let min = confidences.iter().copied().fold(f64::INFINITY, f64::min);
        let max = confidences.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = ordered_sum(confidences.to_vec()) / confidences.len() as f64;
        Self {
            min,
            max,
            mean,
            spread: max - min,
        }
    }
}

/// The same URLs cited in support of two different outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub outcomes: [Outcome; 2],
    /// Up to five shared URLs, sorted.
    pub shared_sources: Vec<String>,
    pub interpretation_conflict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisagreementAnalysis {
    pub has_disagreement: bool,
    /// Votes per outcome, `INVALID` included.
    pub outcome_distribution: BTreeMap<Outcome, usize>,
    /// Over valid agents only.
    pub confidence_stats: ConfidenceStats,
    /// Source overlap within each outcome group of two or more agents.
    pub source_overlap_by_outcome: BTreeMap<Outcome, f64>,
    pub conflicting_evidence: Vec<ConflictRecord>,
    pub contributing_factors: Vec<String>,
    pub resolution_recommendations: Vec<String>,
    pub requires_manual_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
}

/// Analyze the disagreement among `results`.
pub fn analyze(results: &[AgentResult], config: &StrictConsensusConfig) -> DisagreementAnalysis {
    let groups: BTreeMap<Outcome, Vec<AgentResult>> =
        results.iter().fold(BTreeMap::new(), |mut groups, r| {
            groups.entry(r.outcome).or_insert_with(Vec::new).push(r.clone());
            groups
        });

    let outcome_distribution: BTreeMap<Outcome, usize> =
        groups.iter().map(|(o, rs)| (*o, rs.len())).collect();
    let has_disagreement = outcome_distribution.len() > 1;

    let valid_confidences: Vec<f64> = results
        .iter()
        .filter(|r| r.is_valid(config.min_sources_per_agent))
        .map(|r| r.confidence)
        .collect();
    let confidence_stats = ConfidenceStats::from_values(&valid_confidences);

    let source_overlap_by_outcome = groups
        .iter()
        .filter(|(_, rs)| rs.len() >= 2)
        .map(|(o, rs)| (*o, source_overlap(rs)))
        .collect();

    let conflicting_evidence = if has_disagreement {
        find_conflicts(&groups)
    } else {
        Vec::new()
    };

    let high_spread = confidence_stats.spread > config.max_confidence_spread;
    let distinct_outcomes = outcome_distribution.len();

    let mut contributing_factors = Vec::new();
    if high_spread {
        contributing_factors.push("High confidence spread among agents".to_string());
    }
    if !conflicting_evidence.is_empty() {
        contributing_factors.push("Same sources interpreted differently".to_string());
    }
    if distinct_outcomes >= 3 {
        contributing_factors.push("Three-way split in outcomes".to_string());
    }

    let mut resolution_recommendations = Vec::new();
    if high_spread {
        resolution_recommendations
            .push("Consider human review due to confidence variance".to_string());
    }
    if distinct_outcomes >= 3 {
        resolution_recommendations.push("Resolution criteria may need clarification".to_string());
    }
    if !has_disagreement && confidence_stats.mean < LOW_MEAN_CONFIDENCE {
        resolution_recommendations
            .push("Low overall confidence - verify with additional sources".to_string());
    }

    let review_reason = if high_spread {
        Some("High confidence variance".to_string())
    } else if conflicting_evidence.len() > MAX_CONFLICTS {
        Some("Significant evidence conflicts".to_string())
    } else {
        None
    };

    DisagreementAnalysis {
        has_disagreement,
        outcome_distribution,
        confidence_stats,
        source_overlap_by_outcome,
        conflicting_evidence,
        contributing_factors,
        resolution_recommendations,
        requires_manual_review: review_reason.is_some(),
        review_reason,
    }
}

/// Pairwise URL intersections between outcome groups, in outcome order.
fn find_conflicts(groups: &BTreeMap<Outcome, Vec<AgentResult>>) -> Vec<ConflictRecord> {
    let urls: Vec<(Outcome, BTreeSet<&str>)> = groups
        .iter()
        .map(|(o, rs)| {
            let set = rs
                .iter()
                .flat_map(|r| r.sources.iter().map(|s| s.url.as_str()))
                .collect();
            (*o, set)
        })
        .collect();

    let mut conflicts = Vec::new();
    for (i, (outcome_a, urls_a)) in urls.iter().enumerate() {
        for (outcome_b, urls_b) in &urls[i + 1..] {
            let shared: Vec<String> = urls_a
                .intersection(urls_b)
                .take(MAX_SHARED_SOURCES)
                .map(|u| u.to_string())
                .collect();
            if !shared.is_empty() {
                conflicts.push(ConflictRecord {
                    outcomes: [*outcome_a, *outcome_b],
                    shared_sources: shared,
                    interpretation_conflict: true,
                });
            }
        }
    }
    conflicts
}
