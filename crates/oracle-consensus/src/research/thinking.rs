//! Step-by-step record of an agent's thinking while it researches.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Outcome;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingStepType {
    ResearchStart,
    QueryFormulation,
    SearchInitiated,
    SourceFound,
    SourceEvaluated,
    FactExtracted,
    ContradictionDetected,
    EvidenceWeighted,
    HypothesisFormed,
    HypothesisTested,
    ConfidenceUpdated,
    PreliminaryConclusion,
    FinalDetermination,
    UncertaintyNoted,
}

/// One step of an agent's thinking process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingStep {
    pub timestamp: DateTime<Utc>,
    pub step_type: ThinkingStepType,
    pub content: String,
    #[serde(default)]
    pub sources_referenced: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ThinkingStep {
    pub fn new(step_type: ThinkingStepType, content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            step_type,
            content: content.into(),
            sources_referenced: Vec::new(),
            confidence: None,
            agent_id: None,
            duration_ms: None,
            metadata: Map::new(),
        }
    }

    pub fn with_sources(mut self, urls: Vec<String>) -> Self {
        self.sources_referenced = urls;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Accumulates the thinking steps of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingRecorder {
    pub agent_id: String,
    pub steps: Vec<ThinkingStep>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregate view over a recorder's steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingSummary {
    pub agent_id: String,
    pub total_steps: usize,
    pub step_types: BTreeMap<ThinkingStepType, usize>,
    pub sources_count: usize,
    /// Sorted.
    pub unique_sources: Vec<String>,
    pub duration_total_ms: u64,
    /// Confidence of the last step that reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_confidence: Option<f64>,
    pub confidence_progression: Vec<(DateTime<Utc>, f64)>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ThinkingRecorder {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            steps: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Append `step`, stamping it with this recorder's agent id.
    pub fn add_step(&mut self, mut step: ThinkingStep) -> &ThinkingStep {
        step.agent_id = Some(self.agent_id.clone());
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    pub fn record_research_start(&mut self, question: &str, criteria: &str) -> &ThinkingStep {
        self.add_step(
            ThinkingStep::new(
                ThinkingStepType::ResearchStart,
                format!("Starting research on: {question}\nCriteria: {criteria}"),
            )
            .with_confidence(0.5),
        )
    }

    pub fn record_source_found(&mut self, url: &str, title: &str, relevance: &str) -> &ThinkingStep {
        self.add_step(
            ThinkingStep::new(
                ThinkingStepType::SourceFound,
                format!("Found source: {title}\nRelevance: {relevance}"),
            )
            .with_sources(vec![url.to_string()]),
        )
    }

    pub fn record_fact_extracted(
        &mut self,
        fact: &str,
        source_urls: Vec<String>,
        confidence: f64,
    ) -> &ThinkingStep {
        self.add_step(
            ThinkingStep::new(ThinkingStepType::FactExtracted, format!("Extracted fact: {fact}"))
                .with_sources(source_urls)
                .with_confidence(confidence),
        )
    }

    /// Record the final determination and mark the recorder complete.
    pub fn record_conclusion(
        &mut self,
        outcome: Outcome,
        reasoning: &str,
        confidence: f64,
    ) -> &ThinkingStep {
        self.completed_at = Some(Utc::now());
        self.add_step(
            ThinkingStep::new(
                ThinkingStepType::FinalDetermination,
                format!("Conclusion: {outcome}\nReasoning: {reasoning}"),
            )
            .with_confidence(confidence),
        )
    }

    pub fn summary(&self) -> ThinkingSummary {
        let mut step_types = BTreeMap::new();
        for step in &self.steps {
            *step_types.entry(step.step_type).or_insert(0) += 1;
        }

        let unique_sources: BTreeSet<&str> = self
            .steps
            .iter()
            .flat_map(|s| s.sources_referenced.iter().map(String::as_str))
            .collect();

        let confidence_progression: Vec<(DateTime<Utc>, f64)> = self
            .steps
            .iter()
            .filter_map(|s| s.confidence.map(|c| (s.timestamp, c)))
            .collect();

        ThinkingSummary {
            agent_id: self.agent_id.clone(),
            total_steps: self.steps.len(),
            step_types,
            sources_count: unique_sources.len(),
            unique_sources: unique_sources.into_iter().map(str::to_string).collect(),
            duration_total_ms: self.steps.iter().filter_map(|s| s.duration_ms).sum(),
            final_confidence: confidence_progression.last().map(|(_, c)| *c),
            confidence_progression,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    pub fn into_steps(self) -> Vec<ThinkingStep> {
        self.steps
    }
}
