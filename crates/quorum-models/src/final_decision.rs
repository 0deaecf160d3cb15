use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::agent_output::Direction;

const EXPLANATION_MAX_CHARS: usize = 280;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionAction {
    /// Blocked by a guardrail veto or a missing mandatory guardrail.
    NoTrade,
    Buy,
    /// Nothing to recommend.
    NoSignal,
}

/// A submission that was dropped from the cycle, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exclusion {
    pub agent_id: String,
    pub reason: String,
}

/// The one recommendation produced per evaluation cycle.
///
/// Constructed only through [`FinalDecision::no_trade`], [`FinalDecision::buy`]
/// and [`FinalDecision::no_signal`], which keep `direction` and `confidence`
/// present exactly when the action is BUY.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalDecision {
    pub action: DecisionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Decimal>,
    #[serde(default)]
    pub veto_reasons: Vec<String>,
    #[serde(default)]
    pub contributing_agents: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

impl FinalDecision {
    pub fn no_trade(
        veto_reasons: Vec<String>,
        contributing_agents: Vec<String>,
        exclusions: Vec<Exclusion>,
    ) -> Self {
        Self {
            action: DecisionAction::NoTrade,
            direction: None,
            confidence: None,
            veto_reasons,
            contributing_agents,
            exclusions,
        }
    }

    pub fn buy(
        direction: Direction,
        confidence: Decimal,
        contributing_agents: Vec<String>,
        exclusions: Vec<Exclusion>,
    ) -> Self {
        Self {
            action: DecisionAction::Buy,
            direction: Some(direction),
            confidence: Some(confidence),
            veto_reasons: Vec::new(),
            contributing_agents,
            exclusions,
        }
    }

    pub fn no_signal(exclusions: Vec<Exclusion>) -> Self {
        Self {
            action: DecisionAction::NoSignal,
            direction: None,
            confidence: None,
            veto_reasons: Vec::new(),
            contributing_agents: Vec::new(),
            exclusions,
        }
    }

    pub fn is_trade(&self) -> bool {
        self.action == DecisionAction::Buy
    }

    /// One-line summary for operators and UIs.
    pub fn explanation(&self) -> String {
        let text = match (self.action, self.direction, self.confidence) {
            (DecisionAction::NoTrade, _, _) if self.veto_reasons.is_empty() => {
                "trade blocked".to_string()
            }
            (DecisionAction::NoTrade, _, _) => self.veto_reasons.join(" | "),
            (DecisionAction::Buy, Some(direction), Some(confidence)) => format!(
                "BUY {direction} @ {confidence} ({})",
                self.contributing_agents.join(", ")
            ),
            _ => "no directional signal".to_string(),
        };
        shorten(&text, EXPLANATION_MAX_CHARS)
    }
}

fn shorten(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(max_chars - 1).collect();
    format!("{}…", head.trim_end())
}
