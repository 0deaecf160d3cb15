pub mod agent_output;
pub mod config;
pub mod cycle;
pub mod final_decision;
pub mod market_snapshot;

pub use agent_output::{
    AgentAction, AgentFailure, AgentRole, AgentSubmission, Direction, FailureKind,
    MalformedSubmission, MetadataValue, RawAgentOutput,
};
pub use config::{AgentConfig, AgentsConfig, AggregationConfig, QuorumConfig, TieBreak};
pub use cycle::{AgentOutcome, AgentReport, CycleInput, CycleReport};
pub use final_decision::{DecisionAction, Exclusion, FinalDecision};
pub use market_snapshot::{MarketQuote, MarketSnapshot};
