use std::collections::{BTreeSet, HashSet};

use quorum_models::{
    AgentRole, AgentSubmission, AggregationConfig, Exclusion, FinalDecision, TieBreak,
};
use tracing::{debug, info, warn};

use crate::confidence::combine_confidence;
use crate::error::ConfigError;
use crate::guardrail::{evaluate_guardrails, GuardrailVerdict};
use crate::schema::{validate, AgentOutput};
use crate::voter::{tally_votes, Vote};

/// Turns one cycle of agent submissions into a [`FinalDecision`].
///
/// Holds policy only. Each call is independent and deterministic: the same
/// submissions and mandatory set always produce the same decision.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    tie_break: TieBreak,
}

impl Aggregator {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn from_config(config: &AggregationConfig) -> Self {
        Self::new(config.tie_break)
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Run the fixed pipeline: validate, check mandatory guardrails, collect
    /// vetoes, vote, combine confidence.
    ///
    /// Malformed or failed submissions never abort the cycle; they are
    /// recorded in `exclusions`. The only error is a malformed mandatory id,
    /// which is a caller bug.
    pub fn aggregate(
        &self,
        submissions: &[AgentSubmission],
        mandatory_guardrails: &BTreeSet<String>,
    ) -> Result<FinalDecision, ConfigError> {
        check_mandatory_ids(mandatory_guardrails)?;

        let (outputs, exclusions) = admit(submissions);

        let missing: Vec<&String> = mandatory_guardrails
            .iter()
            .filter(|id| {
                !outputs
                    .iter()
                    .any(|o| o.role() == AgentRole::Guardrail && o.agent_id() == id.as_str())
            })
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Mandatory guardrail unavailable, failing safe");
            let reasons = missing
                .iter()
                .map(|id| format!("mandatory guardrail {id} unavailable"))
                .collect();
            return Ok(FinalDecision::no_trade(reasons, Vec::new(), exclusions));
        }

        if outputs.is_empty() {
            warn!(
                excluded = exclusions.len(),
                "No usable agent outputs in cycle"
            );
            return Ok(FinalDecision::no_signal(exclusions));
        }

        if let GuardrailVerdict::Veto { reasons, agents } = evaluate_guardrails(&outputs) {
            info!(vetoed_by = ?agents, "Guardrail veto");
            return Ok(FinalDecision::no_trade(reasons, agents, exclusions));
        }

        let (direction, supporters) = match tally_votes(&outputs, self.tie_break) {
            Vote::Signal {
                direction,
                supporters,
            } => (direction, supporters),
            Vote::NoSignal(reason) => {
                debug!(reason = ?reason, "No directional signal");
                return Ok(FinalDecision::no_signal(exclusions));
            }
        };

        let Some(confidence) = combine_confidence(supporters.iter().copied()) else {
            return Ok(FinalDecision::no_signal(exclusions));
        };
        let contributors: Vec<String> = supporters
            .iter()
            .map(|o| o.agent_id().to_string())
            .collect();

        info!(
            direction = %direction,
            confidence = %confidence,
            contributors = ?contributors,
            "Directional recommendation"
        );
        Ok(FinalDecision::buy(
            direction,
            confidence,
            contributors,
            exclusions,
        ))
    }
}

/// Aggregate with the default policy (ties yield NO_SIGNAL).
pub fn aggregate(
    submissions: &[AgentSubmission],
    mandatory_guardrails: &BTreeSet<String>,
) -> Result<FinalDecision, ConfigError> {
    Aggregator::default().aggregate(submissions, mandatory_guardrails)
}

fn check_mandatory_ids(ids: &BTreeSet<String>) -> Result<(), ConfigError> {
    for id in ids {
        if id.trim().is_empty() {
            return Err(ConfigError::EmptyMandatoryId);
        }
        if id.trim() != id {
            return Err(ConfigError::UntrimmedMandatoryId(id.clone()));
        }
    }
    Ok(())
}

/// Validate submissions in order. The first valid output per agent id is
/// kept; everything else becomes an exclusion.
fn admit(submissions: &[AgentSubmission]) -> (Vec<AgentOutput>, Vec<Exclusion>) {
    let mut outputs: Vec<AgentOutput> = Vec::new();
    let mut exclusions: Vec<Exclusion> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for submission in submissions {
        let reason = match submission {
            AgentSubmission::Failed(failure) => failure.to_string(),
            AgentSubmission::Malformed(malformed) => {
                format!("validation failed: {}", malformed.reason)
            }
            AgentSubmission::Completed(raw) => match validate(raw) {
                Ok(output) if seen.contains(output.agent_id()) => {
                    "duplicate agent_id".to_string()
                }
                Ok(output) => {
                    seen.insert(output.agent_id().to_string());
                    outputs.push(output);
                    continue;
                }
                Err(e) => format!("validation failed: {e}"),
            },
        };

        warn!(agent = %submission.agent_id(), reason = %reason, "Excluding agent from cycle");
        exclusions.push(Exclusion {
            agent_id: submission.agent_id().to_string(),
            reason,
        });
    }

    (outputs, exclusions)
}
