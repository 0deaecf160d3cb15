use quorum_models::AgentRole;

use crate::schema::AgentOutput;

/// Outcome of scanning the guardrail outputs of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardrailVerdict {
    Clear,
    /// Every veto, in submission order.
    Veto {
        reasons: Vec<String>,
        agents: Vec<String>,
    },
}

impl GuardrailVerdict {
    pub fn is_veto(&self) -> bool {
        matches!(self, GuardrailVerdict::Veto { .. })
    }
}

/// Collect all guardrail vetoes. Non-guardrail outputs are skipped, as are
/// abstaining guardrails.
pub fn evaluate_guardrails<'a, I>(outputs: I) -> GuardrailVerdict
where
    I: IntoIterator<Item = &'a AgentOutput>,
{
    let (reasons, agents): (Vec<String>, Vec<String>) = outputs
        .into_iter()
        .filter(|output| output.role() == AgentRole::Guardrail && output.is_veto())
        .map(|output| {
            (
                output.rationale().unwrap_or_default().to_string(),
                output.agent_id().to_string(),
            )
        })
        .unzip();

    if agents.is_empty() {
        GuardrailVerdict::Clear
    } else {
        GuardrailVerdict::Veto { reasons, agents }
    }
}
