//! Per-agent research audit trails.
//!
//! These records are produced by the agent-invocation layer and carried
//! verbatim into the research record; the engine never interprets them.

use serde::{Deserialize, Serialize};

use super::reasoning::ReasoningStep;
use super::thinking::ThinkingStep;
use super::visits::WebsiteVisit;

/// Optional audit trails attached to one agent's result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessRecords {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_process: Option<Vec<ThinkingStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_visits: Option<Vec<WebsiteVisit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_chain: Option<Vec<ReasoningStep>>,
}

impl ProcessRecords {
    pub fn with_thinking(mut self, steps: Vec<ThinkingStep>) -> Self {
        self.thinking_process = Some(steps);
        self
    }

    pub fn with_visits(mut self, visits: Vec<WebsiteVisit>) -> Self {
        self.website_visits = Some(visits);
        self
    }

    pub fn with_reasoning(mut self, steps: Vec<ReasoningStep>) -> Self {
        self.reasoning_chain = Some(steps);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.thinking_process.is_none()
            && self.website_visits.is_none()
            && self.reasoning_chain.is_none()
    }
}
