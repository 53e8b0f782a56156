//! Property tests: order independence of every aggregate and stability of
//! the canonical encoding.

use std::collections::{BTreeMap, BTreeSet};

use oracle_consensus::{
    calculate, calculate_strict, canonical_json, merge_sources, AgentResult, ConsensusConfig,
    Outcome, ResearchSource, SourceCategory, StrictConsensusConfig,
};
use proptest::prelude::*;
use proptest::strategy::ValueTree;
use serde_json::Value;

const CATEGORIES: [SourceCategory; 5] = [
    SourceCategory::Official,
    SourceCategory::News,
    SourceCategory::Social,
    SourceCategory::DomainSpecific,
    SourceCategory::FactCheck,
];

/// URL `k` of a shared pool, with fixed per-URL scores so merged entries
/// agree regardless of which agent is seen first.
fn pooled_source(k: usize) -> ResearchSource {
    let credibility = 0.3 + (k % 7) as f64 * 0.1;
    ResearchSource::new(
        format!("https://pool.example/{k}"),
        format!("pool {k}"),
        CATEGORIES[k % CATEGORIES.len()],
    )
    .with_scores(0.5 + (k % 5) as f64 * 0.1, credibility)
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        4 => Just(Outcome::Yes),
        4 => Just(Outcome::No),
        1 => Just(Outcome::Undetermined),
        1 => Just(Outcome::Invalid),
    ]
}

fn arb_vote() -> impl Strategy<Value = (Outcome, f64, BTreeSet<usize>)> {
    (
        arb_outcome(),
        0.0f64..=1.0,
        prop::collection::btree_set(0usize..80, 0..60),
    )
}

/// A panel with unique agent ids, paired with a shuffled copy.
fn arb_panel_and_shuffle() -> impl Strategy<Value = (Vec<AgentResult>, Vec<AgentResult>)> {
    prop::collection::vec(arb_vote(), 1..8)
        .prop_map(|votes| {
            votes
                .into_iter()
                .enumerate()
                .map(|(i, (outcome, confidence, urls))| {
                    let sources = urls.into_iter().map(pooled_source).collect();
                    AgentResult::new(format!("agent-{i}"), "model", outcome, confidence, "r")
                        .with_sources(sources)
                })
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|panel| (Just(panel.clone()), Just(panel).prop_shuffle()))
}

fn config() -> ConsensusConfig {
    ConsensusConfig::default().with_min_sources_per_agent(20)
}

proptest! {
    #[test]
    fn consensus_ignores_agent_order((panel, shuffled) in arb_panel_and_shuffle()) {
        let a = calculate(&panel, &config());
        let b = calculate(&shuffled, &config());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn strict_outputs_ignore_agent_order((panel, shuffled) in arb_panel_and_shuffle()) {
        let strict = StrictConsensusConfig::new(config());
        let (ca, pa) = calculate_strict(&panel, &strict).unwrap();
        let (cb, pb) = calculate_strict(&shuffled, &strict).unwrap();
        prop_assert_eq!(ca, cb);
        prop_assert_eq!(pa.verification, pb.verification);
        prop_assert_eq!(pa.disagreement, pb.disagreement);
        prop_assert_eq!(pa.tier_distribution, pb.tier_distribution);
    }

    #[test]
    fn merge_keeps_one_entry_per_url((panel, shuffled) in arb_panel_and_shuffle()) {
        let merged = merge_sources(&panel);
        let urls: BTreeSet<&str> = merged.iter().map(|s| s.url.as_str()).collect();
        prop_assert_eq!(urls.len(), merged.len());

        let expected: BTreeSet<&str> = panel
            .iter()
            .flat_map(|r| r.sources.iter().map(|s| s.url.as_str()))
            .collect();
        prop_assert_eq!(&urls, &expected);

        let reshuffled = merge_sources(&shuffled);
        let urls_b: BTreeSet<&str> = reshuffled.iter().map(|s| s.url.as_str()).collect();
        prop_assert_eq!(urls, urls_b);
    }

    #[test]
    fn key_order_does_not_change_canonical_text(
        fields in prop::collection::btree_map("[a-zA-Z_é]{1,8}", -1_000_000i64..1_000_000, 0..12)
    ) {
        let render = |entries: Vec<(&String, &i64)>| {
            let body: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", serde_json::to_string(k).unwrap(), v))
                .collect();
            format!("{{{}}}", body.join(","))
        };
        let forward = render(fields.iter().collect());
        let reversed = render(fields.iter().rev().collect());

        let a: Value = serde_json::from_str(&forward).unwrap();
        let b: Value = serde_json::from_str(&reversed).unwrap();
        prop_assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    }

    #[test]
    fn canonical_text_is_a_fixed_point(
        floats in prop::collection::vec(
            prop::num::f64::NORMAL | prop::num::f64::ZERO,
            0..16,
        ),
        labels in prop::collection::btree_map("\\PC{0,6}", any::<bool>(), 0..6),
    ) {
        let mut doc = serde_json::Map::new();
        doc.insert("floats".into(), serde_json::json!(floats));
        doc.insert(
            "labels".into(),
            Value::Object(labels.into_iter().map(|(k, v)| (k, Value::Bool(v))).collect()),
        );
        let once = canonical_json(&Value::Object(doc)).unwrap();
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        prop_assert_eq!(canonical_json(&reparsed).unwrap(), once);
    }
}

#[test]
fn shuffle_strategy_preserves_agents() {
    let mut runner = proptest::test_runner::TestRunner::deterministic();
    let (panel, shuffled) = arb_panel_and_shuffle()
        .new_tree(&mut runner)
        .unwrap()
        .current();
    assert_eq!(votes_by_agent(&panel), votes_by_agent(&shuffled));
}

fn votes_by_agent(results: &[AgentResult]) -> BTreeMap<String, Outcome> {
    results.iter().map(|r| (r.agent_id.clone(), r.outcome)).collect()
}
