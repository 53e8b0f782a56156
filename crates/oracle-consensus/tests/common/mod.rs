//! Shared fixture builders for integration tests.
#![allow(dead_code)]

use oracle_consensus::{AgentResult, Outcome, ResearchSource, SourceCategory};

/// `n` distinct sources under `prefix`, cycling through every category
/// with credibility from tier 1 down to tier 3.
pub fn sources(prefix: &str, n: usize) -> Vec<ResearchSource> {
    const PROFILE: [(SourceCategory, f64); 5] = [
        (SourceCategory::Official, 0.95),
        (SourceCategory::News, 0.85),
        (SourceCategory::FactCheck, 0.8),
        (SourceCategory::DomainSpecific, 0.7),
        (SourceCategory::Social, 0.5),
    ];
    (0..n)
        .map(|i| {
            let (category, credibility) = PROFILE[i % PROFILE.len()];
            ResearchSource::new(format!("https://{prefix}.example/{i}"), format!("{prefix} {i}"), category)
                .with_scores(0.8, credibility)
        })
        .collect()
}

pub fn agent(id: &str, outcome: Outcome, confidence: f64, sources: Vec<ResearchSource>) -> AgentResult {
    AgentResult::new(id, "gemini-2.0-flash", outcome, confidence, format!("{id} reasoning"))
        .with_sources(sources)
}

/// Agents with disjoint 50-source sets, one per `(outcome, confidence)`.
pub fn panel(votes: &[(Outcome, f64)]) -> Vec<AgentResult> {
    votes
        .iter()
        .enumerate()
        .map(|(i, (outcome, confidence))| {
            let id = format!("agent-{}", i + 1);
            agent(&id, *outcome, *confidence, sources(&id, 50))
        })
        .collect()
}
