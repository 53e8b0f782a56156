//! Research records handed to the storage layer.

pub mod builder;
pub mod process;
pub mod reasoning;
pub mod records;
pub mod thinking;
pub mod visits;

pub use builder::ResearchDataBuilder;
pub use process::ProcessRecords;
pub use reasoning::{evidence_balance, ReasoningChain, ReasoningStep, ReasoningStepType};
pub use records::{
    verify_payload, OracleConfigData, OracleResearchData, PayloadVerification, ResearchDataEntry,
    SealedRecord, ORACLE_CONFIG_VERSION, RESEARCH_DATA_VERSION,
};
pub use thinking::{ThinkingRecorder, ThinkingStep, ThinkingStepType, ThinkingSummary};
pub use visits::{
    categorize_domain, domain_credibility, url_domain, DomainTier, SourceType, VisitStatistics,
    WebsiteTracker, WebsiteVisit,
};
