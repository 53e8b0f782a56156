//! Full resolution: strict consensus, research record, sealing and
//! external verification of the stored payload.

mod common;

use chrono::{DateTime, Utc};
use common::panel;
use oracle_consensus::research::{
    DomainTier, ReasoningChain, SourceType, ThinkingRecorder, ThinkingStep, ThinkingStepType,
    WebsiteTracker, WebsiteVisit,
};
use oracle_consensus::{
    calculate_strict, merge_sources, verify_payload, Hashable, Outcome, ProcessRecords,
    ResearchDataBuilder, StrictConsensusConfig,
};

fn at(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
}

fn resolved_builder() -> ResearchDataBuilder {
    let config = StrictConsensusConfig::default();
    let results = panel(&[(Outcome::Yes, 0.85), (Outcome::Yes, 0.82), (Outcome::No, 0.7)]);
    let (consensus, provable) = calculate_strict(&results, &config).unwrap();

    let mut builder = ResearchDataBuilder::new(
        1042,
        "Will the SEC approve a spot ETF by March 31?",
        "Official SEC press release",
    );
    builder
        .deadline("2025-03-31T23:59:59Z")
        .start_research_at(at("2025-03-01T12:00:00Z"));
    builder
        .build_config(vec!["comprehensive".into(), "news_focused".into()], &config)
        .unwrap();

    let mut thinking = ThinkingRecorder::new("agent-1");
    thinking.add_step(
        ThinkingStep::new(ThinkingStepType::ResearchStart, "Search official filings first")
            .at(at("2025-03-01T12:00:05Z")),
    );
    let mut visits = WebsiteTracker::new("agent-1");
    visits.add_visit(
        WebsiteVisit::new("https://www.sec.gov/news", "SEC news")
            .with_relevance(0.9)
            .with_fact("Approval order published")
            .at(at("2025-03-01T12:01:00Z")),
    );
    let mut reasoning = ReasoningChain::new("agent-1", "Will the SEC approve a spot ETF?");
    reasoning
        .add_conclusion(
            "Approval confirmed by primary source",
            Outcome::Yes,
            0.85,
            vec!["https://www.sec.gov/news".into()],
        )
        .timestamp = at("2025-03-01T12:02:00Z");

    let trail = ProcessRecords::default()
        .with_thinking(thinking.into_steps())
        .with_visits(visits.into_visits())
        .with_reasoning(reasoning.into_steps());

    let mut trails = vec![Some(trail), None, None].into_iter();
    for result in &results {
        builder.add_agent_result(result.clone(), trails.next().flatten());
    }
    builder
        .set_merged_sources(merge_sources(&results))
        .set_consensus(consensus, Some(provable))
        .complete_research_at(at("2025-03-01T12:30:00Z"));
    builder
}

#[test]
fn sealed_record_carries_the_resolution() {
    let mut builder = resolved_builder();
    assert!(builder.is_complete());
    let sealed = builder.build().unwrap();
    let data = &sealed.data;

    assert_eq!(data.version, "2.0.0");
    assert_eq!(data.total_agents, 3);
    assert_eq!(data.valid_agents, 3);
    assert_eq!(data.total_sources, 150);
    assert_eq!(data.unique_sources, 150);
    assert_eq!(data.merged_sources.len(), 150);
    assert!(data.consensus.reached);
    assert_eq!(data.consensus.outcome, Outcome::Yes);
    assert_eq!(
        data.oracle_config_hash.as_deref(),
        Some(builder.oracle_config().unwrap().content_hash().unwrap().as_str())
    );

    let provable = data.provable_data.as_ref().unwrap();
    assert!(provable.verify_hash().is_ok());
    assert!(provable.disagreement.is_some());

    let first = &data.agent_results[0];
    assert_eq!(first.records.thinking_process.as_ref().unwrap().len(), 1);
    let visit = &first.records.website_visits.as_ref().unwrap()[0];
    assert_eq!(visit.domain, "www.sec.gov");
    assert_eq!(visit.credibility_tier, DomainTier::Tier1);
    assert_eq!(visit.source_type, SourceType::Official);
    assert_eq!(visit.agent_id.as_deref(), Some("agent-1"));
    let reasoning = first.records.reasoning_chain.as_ref().unwrap();
    assert_eq!(reasoning[0].step_number, 1);
    assert_eq!(reasoning[0].outcome_support, Some(Outcome::Yes));
    assert!(data.agent_results[1].records.is_empty());

    assert!(sealed.verify().is_ok());
}

#[test]
fn stored_payload_verifies_externally() {
    let sealed = resolved_builder().build().unwrap();
    let text = std::str::from_utf8(sealed.canonical_bytes()).unwrap();

    let check = verify_payload(text, &sealed.sha256_hash).unwrap();
    assert!(check.valid);
    assert_eq!(check.actual_hash, sealed.sha256_hash);

    let pretty = serde_json::to_string_pretty(&sealed.data).unwrap();
    assert!(verify_payload(&pretty, &sealed.sha256_hash.to_uppercase()).unwrap().valid);

    let tampered = text.replacen("\"market_id\":1042", "\"market_id\":1043", 1);
    let check = verify_payload(&tampered, &sealed.sha256_hash).unwrap();
    assert!(!check.valid);
    assert_ne!(check.actual_hash, sealed.sha256_hash);

    assert!(verify_payload("{not json", &sealed.sha256_hash).is_err());
}

#[test]
fn rebuilding_unchanged_state_is_byte_identical() {
    let mut builder = resolved_builder();
    let a = builder.build().unwrap();
    let b = builder.build().unwrap();
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.sha256_hash, b.sha256_hash);
}

#[test]
fn timestamps_are_defaulted_once() {
    let mut builder = ResearchDataBuilder::new(5, "Q?", "criteria");
    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert_eq!(first.data.research_started_at, second.data.research_started_at);
    assert_eq!(first.sha256_hash, second.sha256_hash);
    assert_eq!(first.data.consensus.outcome, Outcome::Undetermined);
}
