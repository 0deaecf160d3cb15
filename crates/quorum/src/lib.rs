//! Quorum - deterministic aggregation of prediction-market decision agents
//!
//! Independent guardrail and directional agents each evaluate a market; the
//! engine merges their outputs into one explainable recommendation: a veto
//! (NO_TRADE), a directional BUY with a conservative confidence, or
//! NO_SIGNAL.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use quorum::models::{AgentSubmission, CycleInput, FinalDecision, QuorumConfig};
//! use quorum::engine::{aggregate, Aggregator};
//! use quorum::agents::{Collector, CommandAgent, DecisionAgent};
//! ```

pub use quorum_agents as agents;
pub use quorum_engine as engine;
pub use quorum_models as models;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use quorum_agents::{AgentError, Collector, CommandAgent, DecisionAgent};
use quorum_engine::Aggregator;
use quorum_models::{CycleInput, CycleReport, FinalDecision, MarketSnapshot, QuorumConfig};

/// Build a Collector over the enabled command agents in `config`.
pub fn build_collector(config: &QuorumConfig) -> Result<Collector, anyhow::Error> {
    let agents: Vec<Arc<dyn DecisionAgent>> = config
        .agents
        .agents
        .iter()
        .filter(|a| a.enabled)
        .map(|a| Arc::new(CommandAgent::from_config(a)) as Arc<dyn DecisionAgent>)
        .collect();

    let mandatory = config
        .aggregation
        .mandatory_guardrails
        .iter()
        .cloned()
        .collect();

    let collector = Collector::new(
        agents,
        Aggregator::from_config(&config.aggregation),
        mandatory,
        Duration::from_secs(config.agents.agent_timeout_seconds),
    )?;
    Ok(collector)
}

/// Aggregate a pre-collected cycle. The mandatory set is the union of the
/// configured ids, the ids named in the input and `extra_mandatory`.
pub fn aggregate_cycle(
    config: &QuorumConfig,
    input: &CycleInput,
    extra_mandatory: &[String],
) -> Result<FinalDecision, anyhow::Error> {
    let mandatory: BTreeSet<String> = config
        .aggregation
        .mandatory_guardrails
        .iter()
        .chain(&input.mandatory_guardrails)
        .chain(extra_mandatory)
        .cloned()
        .collect();

    let decision =
        Aggregator::from_config(&config.aggregation).aggregate(&input.submissions, &mandatory)?;
    Ok(decision)
}

/// Run one live cycle for `snapshot`.
pub async fn evaluate(
    collector: &Collector,
    snapshot: &MarketSnapshot,
) -> Result<CycleReport, AgentError> {
    collector.evaluate(snapshot).await
}
