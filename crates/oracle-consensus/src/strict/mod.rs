//! Strict-mode consensus: vote aggregation plus evidence verification,
//! disagreement analysis and a hashed provable bundle.

pub mod disagreement;
pub mod verification;

pub use disagreement::{analyze, ConfidenceStats, ConflictRecord, DisagreementAnalysis};
pub use verification::{verify, VerificationResult};

use crate::consensus::{calculate, percent, ConsensusResult};
use crate::domain::{AgentResult, Result, StrictConsensusConfig};
use crate::provable::ProvableConsensusData;

/// Strict consensus over `results`.
///
/// Verification and disagreement analysis run in parallel over the full,
/// unfiltered batch. Only agents that are valid and at least
/// `min_individual_confidence` sure take part in the vote. The aggregator's
/// output is then passed through [`amend`], and a provable bundle is always
/// built, whether or not consensus formed.
///
/// Errors only when the bundle cannot be canonicalized (e.g. a NaN score).
pub fn calculate_strict(
    results: &[AgentResult],
    config: &StrictConsensusConfig,
) -> Result<(ConsensusResult, ProvableConsensusData)> {
    let (verification, disagreement) =
        rayon::join(|| verify(results, config), || analyze(results, config));

    let consensus = amend(vote_qualified(results, config), &verification, config);
    let provable = ProvableConsensusData::assemble(results, &consensus, verification, disagreement)?;
    Ok((consensus, provable))
}

/// Run the aggregator over the agents confident enough to vote.
fn vote_qualified(results: &[AgentResult], config: &StrictConsensusConfig) -> ConsensusResult {
    let valid = results
        .iter()
        .filter(|r| r.is_valid(config.min_sources_per_agent))
        .count();
    if results.len() < config.min_agents || valid < config.min_agents {
        // The aggregator reports insufficient participation itself.
        return calculate(results, &config.base);
    }

    let qualified: Vec<AgentResult> = results
        .iter()
        .filter(|r| {
            r.is_valid(config.min_sources_per_agent)
                && r.confidence >= config.min_individual_confidence
        })
        .cloned()
        .collect();
    if qualified.len() < config.min_agents {
        return ConsensusResult::undetermined(
            results.len(),
            format!(
                "Only {} qualified results, need {}",
                qualified.len(),
                config.min_agents
            ),
        );
    }

    calculate(&qualified, &config.base)
}

/// Apply the strict-mode bars to an aggregator result.
///
/// - A reached consensus below `min_consensus_confidence` is downgraded to
///   not reached and flagged for review; the outcome is kept.
/// - A reached consensus whose evidence failed verification stays reached
///   but is flagged for review.
///
/// This is the only place a [`ConsensusResult`] is revised after the
/// aggregator produced it. The input is left untouched.
pub fn amend(
    consensus: ConsensusResult,
    verification: &VerificationResult,
    config: &StrictConsensusConfig,
) -> ConsensusResult {
    if !consensus.reached {
        return consensus;
    }

    let mut amended = consensus;
    if amended.confidence < config.min_consensus_confidence {
        amended.reached = false;
        amended.requires_human_review = true;
        amended.reason = Some(format!(
            "Confidence {} below minimum {}",
            percent(amended.confidence),
            percent(config.min_consensus_confidence)
        ));
    }
    if !verification.passed {
        amended.requires_human_review = true;
    }
    amended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConsensusConfig, Outcome, ResearchSource, SourceCategory};

    fn config() -> StrictConsensusConfig {
        StrictConsensusConfig::new(ConsensusConfig::default().with_min_sources_per_agent(3))
    }

    fn agent(id: &str, outcome: Outcome, confidence: f64) -> AgentResult {
        let sources = vec![
            ResearchSource::new("https://gov/release", "r", SourceCategory::Official)
                .with_scores(0.9, 0.95),
            ResearchSource::new("https://wire/story", "s", SourceCategory::News)
                .with_scores(0.9, 0.85),
            ResearchSource::new(format!("https://fc/{id}"), "f", SourceCategory::FactCheck)
                .with_scores(0.9, 0.75),
        ];
        AgentResult::new(id, "model", outcome, confidence, "r").with_sources(sources)
    }

    fn reached(confidence: f64) -> ConsensusResult {
        ConsensusResult {
            reached: true,
            outcome: Outcome::Yes,
            confidence,
            agreement_ratio: 1.0,
            weighted_ratio: 1.0,
            total_sources: 3,
            unique_sources: 3,
            source_overlap: 1.0,
            agent_count: 3,
            requires_human_review: false,
            reason: None,
        }
    }

    fn verification(passed: bool) -> VerificationResult {
        verify(&[], &StrictConsensusConfig {
            min_tier1_sources: if passed { 0 } else { 1 },
            min_tier2_sources: 0,
            ..StrictConsensusConfig::default()
        })
    }

    #[test]
    fn test_amend_leaves_clean_consensus_alone() {
        let consensus = reached(0.85);
        let amended = amend(consensus.clone(), &verification(true), &config());
        assert_eq!(amended, consensus);
    }

    #[test]
    fn test_amend_downgrades_low_confidence() {
        let amended = amend(reached(0.65), &verification(true), &config());
        assert!(!amended.reached);
        assert_eq!(amended.outcome, Outcome::Yes);
        assert!(amended.requires_human_review);
        assert_eq!(
            amended.reason.as_deref(),
            Some("Confidence 65.0% below minimum 70.0%")
        );
    }

    #[test]
    fn test_amend_flags_failed_verification_without_unreaching() {
        let amended = amend(reached(0.85), &verification(false), &config());
        assert!(amended.reached);
        assert!(amended.requires_human_review);
        assert!(amended.reason.is_none());
    }

    #[test]
    fn test_amend_ignores_unreached_consensus() {
        let consensus = ConsensusResult::undetermined(3, "No supermajority");
        let amended = amend(consensus.clone(), &verification(false), &config());
        assert_eq!(amended, consensus);
    }

    #[test]
    fn test_strict_unanimous_consensus_passes() {
        let results = vec![
            agent("a1", Outcome::Yes, 0.85),
            agent("a2", Outcome::Yes, 0.82),
            agent("a3", Outcome::Yes, 0.88),
        ];
        let (consensus, provable) = calculate_strict(&results, &config()).unwrap();
        assert!(consensus.reached);
        assert_eq!(consensus.outcome, Outcome::Yes);
        assert!(!consensus.requires_human_review);
        assert!(provable.verification.passed);
        assert_eq!(provable.verification.cross_verified_facts, 2);
        assert!(provable.disagreement.is_none());
        assert!(provable.verify_hash().is_ok());
    }

    #[test]
    fn test_low_confidence_agents_do_not_vote() {
        let results = vec![
            agent("a1", Outcome::Yes, 0.85),
            agent("a2", Outcome::Yes, 0.82),
            agent("a3", Outcome::No, 0.4),
        ];
        let (consensus, provable) = calculate_strict(&results, &config()).unwrap();
        assert_eq!(consensus.outcome, Outcome::Undetermined);
        assert_eq!(
            consensus.reason.as_deref(),
            Some("Only 2 qualified results, need 3")
        );
        assert_eq!(consensus.agent_count, 3);
        // Disagreement analysis still sees the dissenting vote.
        let disagreement = provable.disagreement.unwrap();
        assert_eq!(disagreement.outcome_distribution[&Outcome::No], 1);
    }

    #[test]
    fn test_insufficient_participation_stays_invalid() {
        let results = vec![agent("a1", Outcome::Yes, 0.9)];
        let (consensus, provable) = calculate_strict(&results, &config()).unwrap();
        assert_eq!(consensus.outcome, Outcome::Invalid);
        assert_eq!(provable.outcome, Outcome::Invalid);
        assert!(!provable.consensus_reached);
    }

    #[test]
    fn test_unhashable_input_is_an_error() {
        // The NaN lands in the disagreement's mean confidence.
        let results = vec![
            agent("a1", Outcome::No, f64::NAN),
            agent("a2", Outcome::Yes, 0.82),
            agent("a3", Outcome::Yes, 0.88),
        ];
        assert!(calculate_strict(&results, &config()).is_err());
    }
}
