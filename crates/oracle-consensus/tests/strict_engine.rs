//! Strict-mode resolution: verification, disagreement and the provable bundle.

mod common;

use common::{agent, panel, sources};
use oracle_consensus::{
    calculate_strict, CredibilityTier, Hashable, Outcome, ResearchSource, SourceCategory,
    StrictConsensusConfig,
};

#[test]
fn unanimous_panel_passes_strict_mode() {
    let results = panel(&[(Outcome::Yes, 0.85), (Outcome::Yes, 0.82), (Outcome::Yes, 0.88)]);
    let (consensus, provable) = calculate_strict(&results, &StrictConsensusConfig::default()).unwrap();

    assert!(consensus.reached);
    assert_eq!(consensus.outcome, Outcome::Yes);
    assert!(!consensus.requires_human_review);
    assert!(provable.consensus_reached);
    assert_eq!(provable.unique_sources, 150);
    assert!(provable.verification.passed);
    assert_eq!(provable.verification.unique_sources, 150);
    assert_eq!(provable.verification.source_categories.len(), 5);
    // Disjoint evidence: nothing is cross-verified, which is only a warning.
    assert_eq!(provable.verification.cross_verified_facts, 0);
    assert_eq!(provable.verification.warnings.len(), 1);
    assert!(provable.disagreement.is_none());

    assert_eq!(provable.tier_distribution[&CredibilityTier::Tier1], 30);
    assert_eq!(provable.tier_distribution[&CredibilityTier::Tier2], 90);
    assert_eq!(provable.tier_distribution[&CredibilityTier::Tier3], 30);
    assert!(!provable.tier_distribution.contains_key(&CredibilityTier::Tier4And5));
    assert!(provable.verify_hash().is_ok());
}

#[test]
fn low_consensus_confidence_is_downgraded() {
    let results = panel(&[(Outcome::No, 0.65), (Outcome::No, 0.66), (Outcome::No, 0.67)]);
    let (consensus, provable) = calculate_strict(&results, &StrictConsensusConfig::default()).unwrap();

    assert!(!consensus.reached);
    assert_eq!(consensus.outcome, Outcome::No);
    assert!(consensus.requires_human_review);
    assert_eq!(
        consensus.reason.as_deref(),
        Some("Confidence 66.0% below minimum 70.0%")
    );
    assert!(!provable.consensus_reached);
}

#[test]
fn thin_evidence_keeps_consensus_but_requires_review() {
    let social = |prefix: &str| -> Vec<ResearchSource> {
        (0..50)
            .map(|i| {
                ResearchSource::new(format!("https://{prefix}/{i}"), "post", SourceCategory::Social)
                    .with_scores(0.6, 0.4)
            })
            .collect()
    };
    let results = vec![
        agent("a1", Outcome::Yes, 0.9, social("a1")),
        agent("a2", Outcome::Yes, 0.9, social("a2")),
        agent("a3", Outcome::Yes, 0.9, social("a3")),
    ];
    let (consensus, provable) = calculate_strict(&results, &StrictConsensusConfig::default()).unwrap();

    assert!(consensus.reached);
    assert!(consensus.requires_human_review);
    assert!(!provable.verification.passed);
    assert_eq!(provable.verification.issues.len(), 2);
    assert_eq!(provable.tier_distribution[&CredibilityTier::Tier4And5], 150);
}

#[test]
fn disagreement_sees_unqualified_votes() {
    let shared = sources("wire", 10);
    let results = vec![
        agent("a1", Outcome::Yes, 0.9, [shared.clone(), sources("a1", 40)].concat()),
        agent("a2", Outcome::Yes, 0.85, [shared.clone(), sources("a2", 40)].concat()),
        agent("a3", Outcome::Yes, 0.88, sources("a3", 50)),
        agent("a4", Outcome::No, 0.3, [shared, sources("a4", 40)].concat()),
    ];
    let (consensus, provable) = calculate_strict(&results, &StrictConsensusConfig::default()).unwrap();

    assert!(consensus.reached);
    assert_eq!(consensus.outcome, Outcome::Yes);
    assert_eq!(consensus.agent_count, 3);

    let disagreement = provable.disagreement.expect("disagreement payload");
    assert_eq!(disagreement.outcome_distribution[&Outcome::No], 1);
    assert_eq!(disagreement.conflicting_evidence.len(), 1);
    assert_eq!(disagreement.conflicting_evidence[0].shared_sources.len(), 5);
    assert!(disagreement.requires_manual_review);
    assert_eq!(disagreement.review_reason.as_deref(), Some("High confidence variance"));
    assert_eq!(provable.verification.cross_verified_facts, 10);
}

#[test]
fn provable_hash_excludes_itself() {
    let results = panel(&[(Outcome::Yes, 0.85), (Outcome::No, 0.82), (Outcome::Yes, 0.88)]);
    let (_, provable) = calculate_strict(&results, &StrictConsensusConfig::default()).unwrap();

    let canonical = provable.canonical_json().unwrap();
    assert!(!canonical.contains("data_hash"));
    assert_eq!(
        provable.data_hash,
        oracle_consensus::sha256_hex(canonical.as_bytes())
    );

    let mut edited = provable.clone();
    edited.agent_count += 1;
    assert!(edited.verify_hash().is_err());
    edited.refresh_hash().unwrap();
    assert!(edited.verify_hash().is_ok());
}

#[test]
fn strict_is_idempotent() {
    let results = panel(&[(Outcome::Yes, 0.85), (Outcome::No, 0.82), (Outcome::Yes, 0.88)]);
    let config = StrictConsensusConfig::default();
    let (c1, p1) = calculate_strict(&results, &config).unwrap();
    let (c2, p2) = calculate_strict(&results, &config).unwrap();
    assert_eq!(c1, c2);
    assert_eq!(p1.verification, p2.verification);
    assert_eq!(p1.disagreement, p2.disagreement);
    assert_eq!(p1.tier_distribution, p2.tier_distribution);
}
