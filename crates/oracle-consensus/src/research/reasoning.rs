//! The reasoning chain that leads an agent to its determination.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consensus::ordered_sum;
use crate::domain::Outcome;

/// Confidence impact recorded for a contradiction in the evidence.
const CONTRADICTION_IMPACT: f64 = -0.1;
/// Confidence impact recorded for a noted uncertainty.
const UNCERTAINTY_IMPACT: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningStepType {
    Observation,
    Synthesis,
    Conclusion,
    Assumption,
    Inference,
    Contradiction,
    Uncertainty,
    WeightEvidence,
}

/// One link of an agent's reasoning chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step_number: u32,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub step_type: ReasoningStepType,
    pub content: String,
    #[serde(default)]
    pub supporting_evidence: Vec<String>,
    /// Signed effect on confidence, in [-1, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_impact: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_support: Option<Outcome>,
}

impl ReasoningStep {
    pub fn new(step_number: u32, step_type: ReasoningStepType, content: impl Into<String>) -> Self {
        Self {
            step_number,
            timestamp: Utc::now(),
            step_type,
            content: content.into(),
            supporting_evidence: Vec::new(),
            confidence_impact: None,
            outcome_support: None,
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.supporting_evidence = evidence;
        self
    }

    /// Clamped to [-1, 1].
    pub fn with_confidence_impact(mut self, impact: f64) -> Self {
        self.confidence_impact = Some(impact.clamp(-1.0, 1.0));
        self
    }

    pub fn supporting(mut self, outcome: Outcome) -> Self {
        self.outcome_support = Some(outcome);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Ordered reasoning steps of one agent, numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningChain {
    pub agent_id: String,
    #[serde(default)]
    pub question: String,
    pub steps: Vec<ReasoningStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_confidence: Option<f64>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReasoningChain {
    pub fn new(agent_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            question: question.into(),
            steps: Vec::new(),
            final_outcome: None,
            final_confidence: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Append a step of `step_type`, numbered after the last one.
    pub fn add_step(
        &mut self,
        step_type: ReasoningStepType,
        content: impl Into<String>,
        evidence: Vec<String>,
    ) -> &mut ReasoningStep {
        let number = self.steps.len() as u32 + 1;
        self.steps
            .push(ReasoningStep::new(number, step_type, content).with_evidence(evidence));
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    pub fn add_observation(
        &mut self,
        observation: impl Into<String>,
        sources: Vec<String>,
        outcome_support: Option<Outcome>,
    ) -> &mut ReasoningStep {
        let step = self.add_step(ReasoningStepType::Observation, observation, sources);
        step.outcome_support = outcome_support;
        step
    }

    pub fn add_synthesis(
        &mut self,
        synthesis: impl Into<String>,
        based_on: Vec<String>,
        outcome_support: Option<Outcome>,
    ) -> &mut ReasoningStep {
        let step = self.add_step(ReasoningStepType::Synthesis, synthesis, based_on);
        step.outcome_support = outcome_support;
        step
    }

    /// Record the conclusion; the chain takes its outcome and confidence.
    pub fn add_conclusion(
        &mut self,
        conclusion: impl Into<String>,
        outcome: Outcome,
        confidence: f64,
        evidence: Vec<String>,
    ) -> &mut ReasoningStep {
        self.final_outcome = Some(outcome);
        self.final_confidence = Some(confidence);
        self.completed_at = Some(Utc::now());
        let step = self.add_step(ReasoningStepType::Conclusion, conclusion, evidence);
        step.outcome_support = Some(outcome);
        step
    }

    pub fn add_contradiction(
        &mut self,
        description: impl Into<String>,
        conflicting_sources: Vec<String>,
    ) -> &mut ReasoningStep {
        let step = self.add_step(ReasoningStepType::Contradiction, description, conflicting_sources);
        step.confidence_impact = Some(CONTRADICTION_IMPACT);
        step
    }

    pub fn add_uncertainty(&mut self, description: &str, reason: &str) -> &mut ReasoningStep {
        let step = self.add_step(
            ReasoningStepType::Uncertainty,
            format!("{description}. Reason: {reason}"),
            Vec::new(),
        );
        step.confidence_impact = Some(UNCERTAINTY_IMPACT);
        step
    }

    pub fn observations(&self) -> Vec<&ReasoningStep> {
        self.steps
            .iter()
            .filter(|s| s.step_type == ReasoningStepType::Observation)
            .collect()
    }

    pub fn evidence_for(&self, outcome: Outcome) -> Vec<&ReasoningStep> {
        self.steps
            .iter()
            .filter(|s| s.outcome_support == Some(outcome))
            .collect()
    }

    /// Summed confidence impact of the steps supporting each votable outcome.
    pub fn evidence_balance(&self) -> BTreeMap<Outcome, f64> {
        evidence_balance(&self.steps)
    }

    pub fn into_steps(self) -> Vec<ReasoningStep> {
        self.steps
    }
}

/// Summed `confidence_impact` per supported outcome over `steps`.
///
/// Every votable outcome is present, at 0.0 when nothing supports it. Steps
/// without an impact or supporting `INVALID` do not count.
pub fn evidence_balance(steps: &[ReasoningStep]) -> BTreeMap<Outcome, f64> {
    Outcome::VOTABLE
        .iter()
        .map(|outcome| {
            let impacts = steps
                .iter()
                .filter(|s| s.outcome_support == Some(*outcome))
                .filter_map(|s| s.confidence_impact)
                .collect();
            (*outcome, ordered_sum(impacts))
        })
        .collect()
}
