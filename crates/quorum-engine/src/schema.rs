//! The agent output contract.
//!
//! [`validate`] is the only way to obtain an [`AgentOutput`], so every value
//! downstream of it already satisfies the schema invariants.

use std::collections::BTreeMap;
use std::str::FromStr;

use quorum_models::{AgentAction, AgentRole, Direction, MetadataValue, RawAgentOutput};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;

/// A validated agent result for one cycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentOutput {
    agent_id: String,
    role: AgentRole,
    action: AgentAction,
    direction: Option<Direction>,
    confidence: Decimal,
    rationale: Option<String>,
    metadata: BTreeMap<String, MetadataValue>,
}

impl AgentOutput {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn action(&self) -> AgentAction {
        self.action
    }

    /// Present exactly when the action is BUY.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn confidence(&self) -> Decimal {
        self.confidence
    }

    /// Always present and non-blank when the action is NO_TRADE.
    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    /// A guardrail blocking the trade.
    pub fn is_veto(&self) -> bool {
        self.role == AgentRole::Guardrail && self.action == AgentAction::NoTrade
    }

    /// The side this output votes for, if it is a directional BUY.
    pub fn buy_vote(&self) -> Option<Direction> {
        match (self.role, self.action) {
            (AgentRole::Directional, AgentAction::Buy) => self.direction,
            _ => None,
        }
    }
}

/// Check a raw result against the schema.
///
/// Values are accepted or rejected as given; nothing is trimmed, clamped or
/// defaulted.
pub fn validate(raw: &RawAgentOutput) -> Result<AgentOutput, ValidationError> {
    if raw.agent_id.is_empty() {
        return Err(ValidationError::MissingAgentId);
    }

    let role = match raw.role.as_deref() {
        None => return Err(ValidationError::MissingRole),
        Some(value) => {
            AgentRole::parse(value).ok_or_else(|| ValidationError::UnknownRole(value.to_string()))?
        }
    };

    let action = match raw.action.as_deref() {
        None => return Err(ValidationError::MissingAction),
        Some(value) => AgentAction::parse(value)
            .ok_or_else(|| ValidationError::UnknownAction(value.to_string()))?,
    };

    if role == AgentRole::Guardrail && action == AgentAction::Buy {
        return Err(ValidationError::GuardrailBuy);
    }

    let direction = match raw.direction.as_deref() {
        None => None,
        Some(value) => Some(
            Direction::parse(value)
                .ok_or_else(|| ValidationError::UnknownDirection(value.to_string()))?,
        ),
    };

    match (action, direction) {
        (AgentAction::Buy, None) => return Err(ValidationError::MissingDirection),
        (AgentAction::NoTrade | AgentAction::Abstain, Some(_)) => {
            return Err(ValidationError::UnexpectedDirection(action))
        }
        _ => {}
    }

    let confidence = match &raw.confidence {
        None | Some(Value::Null) => return Err(ValidationError::MissingConfidence),
        Some(value) => parse_confidence(value)?,
    };

    if confidence < Decimal::ZERO || confidence > Decimal::ONE {
        return Err(ValidationError::ConfidenceOutOfRange(confidence));
    }

    if action == AgentAction::NoTrade
        && raw
            .rationale
            .as_deref()
            .map_or(true, |r| r.trim().is_empty())
    {
        return Err(ValidationError::MissingRationale);
    }

    let metadata = parse_metadata(raw.metadata.as_ref())?;

    Ok(AgentOutput {
        agent_id: raw.agent_id.clone(),
        role,
        action,
        direction,
        confidence,
        rationale: raw.rationale.clone(),
        metadata,
    })
}

fn parse_confidence(value: &Value) -> Result<Decimal, ValidationError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => return Err(ValidationError::InvalidConfidence(other.to_string())),
    };

    let (mantissa, scientific) = match text.find(|c| c == 'e' || c == 'E') {
        Some(at) => (&text[..at], true),
        None => (text.as_str(), false),
    };

    // `from_str` rounds past 28 significant digits; only an exact parse of the
    // mantissa keeps the value as given.
    if Decimal::from_str(mantissa).is_err() {
        return Err(ValidationError::InvalidConfidence(value.to_string()));
    }
    let exact = Decimal::from_str_exact(mantissa)
        .map_err(|_| ValidationError::InexactConfidence(text.clone()))?;

    if scientific {
        Decimal::from_scientific(&text)
            .map_err(|_| ValidationError::InvalidConfidence(value.to_string()))
    } else {
        Ok(exact)
    }
}

fn parse_metadata(
    value: Option<&Value>,
) -> Result<BTreeMap<String, MetadataValue>, ValidationError> {
    let map = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(ValidationError::InvalidMetadata(json_kind(other).to_string())),
    };

    map.iter()
        .map(|(key, value)| {
            let scalar = match value {
                Value::Bool(b) => MetadataValue::Bool(*b),
                Value::Number(n) => MetadataValue::Number(n.clone()),
                Value::String(s) => MetadataValue::Text(s.clone()),
                _ => return Err(ValidationError::NonScalarMetadata(key.clone())),
            };
            Ok((key.clone(), scalar))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
