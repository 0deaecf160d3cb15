//! Stub agents for exercising the collector and aggregator without running
//! real agents.
//!
//! Each stub returns a fixed raw output, fails, panics, or derives its output
//! from the snapshot, optionally after a delay so timeouts can be tested.

use std::time::Duration;

use async_trait::async_trait;
use quorum_models::{AgentAction, AgentRole, Direction, MarketSnapshot, RawAgentOutput};
use rust_decimal::Decimal;

use crate::agent::DecisionAgent;
use crate::error::AgentError;

pub enum StubResponse {
    Output(RawAgentOutput),
    Error(String),
    Panic,
    FromSnapshot(fn(&MarketSnapshot) -> RawAgentOutput),
}

pub struct StubAgent {
    pub id: String,
    pub role: AgentRole,
    pub response: StubResponse,
    pub delay: Duration,
}

impl StubAgent {
    pub fn new(id: &str, role: AgentRole, response: StubResponse) -> Self {
        Self {
            id: id.to_string(),
            role,
            response,
            delay: Duration::ZERO,
        }
    }

    /// A guardrail that lets the trade through.
    pub fn clear(id: &str) -> Self {
        Self::new(
            id,
            AgentRole::Guardrail,
            StubResponse::Output(
                RawAgentOutput::new(id, AgentRole::Guardrail, AgentAction::Abstain)
                    .with_confidence(Decimal::ONE),
            ),
        )
    }

    pub fn veto(id: &str, rationale: &str) -> Self {
        Self::new(
            id,
            AgentRole::Guardrail,
            StubResponse::Output(
                RawAgentOutput::new(id, AgentRole::Guardrail, AgentAction::NoTrade)
                    .with_confidence(Decimal::ZERO)
                    .with_rationale(rationale),
            ),
        )
    }

    pub fn buy(id: &str, direction: Direction, confidence: Decimal) -> Self {
        Self::new(
            id,
            AgentRole::Directional,
            StubResponse::Output(
                RawAgentOutput::new(id, AgentRole::Directional, AgentAction::Buy)
                    .with_direction(direction)
                    .with_confidence(confidence),
            ),
        )
    }

    pub fn failing(id: &str, role: AgentRole, message: &str) -> Self {
        Self::new(id, role, StubResponse::Error(message.to_string()))
    }

    pub fn panicking(id: &str, role: AgentRole) -> Self {
        Self::new(id, role, StubResponse::Panic)
    }

    /// Buy the side with the lower ask; abstain when either ask is missing or
    /// they are equal.
    pub fn cheaper_side(id: &str) -> Self {
        fn decide(snapshot: &MarketSnapshot) -> RawAgentOutput {
            let abstain = || {
                RawAgentOutput::new("", AgentRole::Directional, AgentAction::Abstain)
                    .with_confidence(Decimal::ZERO)
            };
            let (Some(yes), Some(no)) = (snapshot.yes_ask, snapshot.no_ask) else {
                return abstain();
            };
            let direction = match yes.cmp(&no) {
                std::cmp::Ordering::Less => Direction::Yes,
                std::cmp::Ordering::Greater => Direction::No,
                std::cmp::Ordering::Equal => return abstain(),
            };
            RawAgentOutput::new("", AgentRole::Directional, AgentAction::Buy)
                .with_direction(direction)
                .with_confidence((yes - no).abs().min(Decimal::ONE))
        }
        Self::new(id, AgentRole::Directional, StubResponse::FromSnapshot(decide))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl DecisionAgent for StubAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> AgentRole {
        self.role
    }

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<RawAgentOutput, AgentError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.response {
            StubResponse::Output(raw) => Ok(raw.clone()),
            StubResponse::Error(message) => Err(AgentError::Command(message.clone())),
            StubResponse::Panic => panic!("stub agent {} panicked", self.id),
            StubResponse::FromSnapshot(decide) => {
                let mut raw = decide(snapshot);
                raw.agent_id = self.id.clone();
                Ok(raw)
            }
        }
    }
}
