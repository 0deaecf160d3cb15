use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent_output::{AgentRole, AgentSubmission};
use crate::final_decision::FinalDecision;

/// A pre-collected cycle: everything the aggregator needs, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleInput {
    pub submissions: Vec<AgentSubmission>,
    #[serde(default)]
    pub mandatory_guardrails: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentOutcome {
    Completed,
    TimedOut,
    Failed,
}

/// Per-agent execution record kept alongside the decision for auditing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentReport {
    pub agent_id: String,
    pub role: AgentRole,
    pub outcome: AgentOutcome,
    pub elapsed_ms: u64,
}

/// A decision together with the run that produced it.
///
/// The decision itself is deterministic; the id, timestamps and timings here
/// are not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub ticker: String,
    pub started_at: DateTime<Utc>,
    pub decision: FinalDecision,
    pub agent_reports: Vec<AgentReport>,
    pub processing_time_ms: u64,
}
