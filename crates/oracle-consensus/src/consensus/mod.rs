//! Weighted vote aggregation.
//!
//! [`calculate`] reduces a batch of [`AgentResult`]s to a [`ConsensusResult`].
//! The reduction is a pure function of the multiset of results: reordering
//! the input never changes the output. Float sums are taken over sorted
//! values so rounding does not depend on input order either.

pub mod sources;

use serde::{Deserialize, Serialize};

use crate::domain::{AgentResult, ConsensusConfig, Hashable, Outcome};

pub use sources::{merge_sources, source_overlap, source_quality, vote_weight};

/// Result of consensus calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub reached: bool,
    pub outcome: Outcome,
    /// Mean confidence of the winning agents; 0 when not reached.
    pub confidence: f64,
    /// Head-count share of the winning outcome among valid agents.
    pub agreement_ratio: f64,
    /// Weight share of the winning outcome.
    pub weighted_ratio: f64,
    pub total_sources: usize,
    pub unique_sources: usize,
    pub source_overlap: f64,
    pub agent_count: usize,
    pub requires_human_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ConsensusResult {
    /// Not reached, `INVALID`: too few agents took part.
    pub fn insufficient(agent_count: usize, reason: String) -> Self {
        Self {
            reached: false,
            outcome: Outcome::Invalid,
            confidence: 0.0,
            agreement_ratio: 0.0,
            weighted_ratio: 0.0,
            total_sources: 0,
            unique_sources: 0,
            source_overlap: 0.0,
            agent_count,
            requires_human_review: true,
            reason: Some(reason),
        }
    }

    /// Not reached, `UNDETERMINED`, flagged for review.
    pub fn undetermined(agent_count: usize, reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Undetermined,
            reason: Some(reason.into()),
            ..Self::insufficient(agent_count, String::new())
        }
    }

    /// `true` when consensus formed and nothing asks for a human.
    pub fn is_final(&self) -> bool {
        self.reached && !self.requires_human_review
    }
}

impl Hashable for ConsensusResult {}

/// Calculate weighted consensus over `results`.
///
/// 1. Fewer than `min_agents` results, or fewer than `min_agents` valid
///    ones, yields `INVALID` with a reason. These are the only `INVALID` paths.
/// 2. Valid votes are weighted by [`vote_weight`] and bucketed by outcome.
/// 3. The outcome with the largest summed weight wins; exact ties go to the
///    first of `YES`, `NO`, `UNDETERMINED`.
/// 4. If the effective ratio (weighted or head-count, per config) reaches the
///    threshold, consensus is reached; otherwise the outcome is forced to
///    `UNDETERMINED` and the result is flagged for review.
pub fn calculate(results: &[AgentResult], config: &ConsensusConfig) -> ConsensusResult {
    if results.len() < config.min_agents {
        return ConsensusResult::insufficient(
            results.len(),
            format!(
                "Need {}+ agents, got {}",
                config.min_agents,
                results.len()
            ),
        );
    }

    let valid: Vec<&AgentResult> = results
        .iter()
        .filter(|r| r.is_valid(config.min_sources_per_agent))
        .collect();
    if valid.len() < config.min_agents {
        return ConsensusResult::insufficient(
            results.len(),
            format!(
                "Only {} valid results, need {}",
                valid.len(),
                config.min_agents
            ),
        );
    }

    let tally = Tally::collect(&valid, config.min_sources_per_agent);
    let winner = tally.winner();
    let winning_voters = tally.voters(winner);

    let winning_ratio = winning_voters.len() as f64 / valid.len() as f64;
    let total_weight = tally.total_weight();
    let weighted_ratio = if total_weight > 0.0 {
        tally.weight(winner) / total_weight
    } else {
        0.0
    };
    let effective_ratio = if config.use_weighted_voting {
        weighted_ratio
    } else {
        winning_ratio
    };

    if effective_ratio >= config.threshold {
        let winners: Vec<AgentResult> = winning_voters.iter().map(|r| (*r).clone()).collect();
        let confidence =
            ordered_sum(winners.iter().map(|r| r.confidence).collect()) / winners.len() as f64;

        ConsensusResult {
            reached: true,
            outcome: winner,
            confidence,
            agreement_ratio: winning_ratio,
            weighted_ratio,
            total_sources: winners.iter().map(|r| r.sources.len()).sum(),
            unique_sources: merge_sources(&winners).len(),
            source_overlap: source_overlap(&winners),
            agent_count: valid.len(),
            requires_human_review: false,
            reason: None,
        }
    } else {
        ConsensusResult {
            agreement_ratio: winning_ratio,
            weighted_ratio,
            ..ConsensusResult::undetermined(
                valid.len(),
                format!(
                    "No supermajority: highest agreement is {} (weighted {}), threshold {}",
                    percent(winning_ratio),
                    percent(weighted_ratio),
                    percent(config.threshold)
                ),
            )
        }
    }
}

/// Valid votes bucketed by outcome.
struct Tally<'a> {
    buckets: Vec<(Outcome, Vec<&'a AgentResult>, Vec<f64>)>,
}

impl<'a> Tally<'a> {
    fn collect(valid: &[&'a AgentResult], min_sources_per_agent: usize) -> Self {
        let buckets = Outcome::VOTABLE
            .iter()
            .map(|outcome| {
                let voters: Vec<&AgentResult> = valid
                    .iter()
                    .copied()
                    .filter(|r| r.outcome == *outcome)
                    .collect();
                let weights = voters
                    .iter()
                    .map(|r| vote_weight(r, min_sources_per_agent))
                    .collect();
                (*outcome, voters, weights)
            })
            .collect();
        Self { buckets }
    }

    /// Highest summed weight; the earlier outcome wins exact ties.
    fn winner(&self) -> Outcome {
        let mut best = Outcome::VOTABLE[0];
        let mut best_weight = f64::NEG_INFINITY;
        for (outcome, _, _) in &self.buckets {
            let weight = self.weight(*outcome);
            if weight > best_weight {
                best = *outcome;
                best_weight = weight;
            }
        }
        best
    }

    fn voters(&self, outcome: Outcome) -> &[&'a AgentResult] {
        self.buckets
            .iter()
            .find(|(o, _, _)| *o == outcome)
            .map(|(_, voters, _)| voters.as_slice())
            .unwrap_or(&[])
    }

    fn weight(&self, outcome: Outcome) -> f64 {
        self.buckets
            .iter()
            .find(|(o, _, _)| *o == outcome)
            .map(|(_, _, weights)| ordered_sum(weights.clone()))
            .unwrap_or(0.0)
    }

    fn total_weight(&self) -> f64 {
        ordered_sum(
            self.buckets
                .iter()
                .flat_map(|(_, _, weights)| weights.iter().copied())
                .collect(),
        )
    }
}

/// Sum after sorting, so the result does not depend on input order.
pub(crate) fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

pub(crate) fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
