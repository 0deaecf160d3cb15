use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Which part of the pipeline an agent feeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRole {
    /// Can block a trade (NO_TRADE) or abstain, never propose one.
    Guardrail,
    /// Proposes a BUY on one side, or abstains.
    Directional,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Guardrail => "GUARDRAIL",
            AgentRole::Directional => "DIRECTIONAL",
        }
    }

    /// Parse the wire form. Only the exact uppercase enumerator is accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GUARDRAIL" => Some(AgentRole::Guardrail),
            "DIRECTIONAL" => Some(AgentRole::Directional),
            _ => None,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentAction {
    NoTrade,
    Buy,
    Abstain,
}

impl AgentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentAction::NoTrade => "NO_TRADE",
            AgentAction::Buy => "BUY",
            AgentAction::Abstain => "ABSTAIN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NO_TRADE" => Some(AgentAction::NoTrade),
            "BUY" => Some(AgentAction::Buy),
            "ABSTAIN" => Some(AgentAction::Abstain),
            _ => None,
        }
    }
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The contract side being bought.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Yes,
    No,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Yes => "YES",
            Direction::No => "NO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "YES" => Some(Direction::Yes),
            "NO" => Some(Direction::No),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar metadata value. Nested arrays and objects are not allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

/// An agent result exactly as the agent produced it.
///
/// Every field is loosely typed so that a malformed result still deserializes
/// and can be rejected field by field during validation, instead of failing
/// the whole cycle at the JSON layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawAgentOutput {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    /// A JSON number or a decimal string. JSON numbers pass through `f64`,
    /// so values needing more precision must be sent as strings.
    #[serde(default)]
    pub confidence: Option<serde_json::Value>,
    #[serde(default)]
    pub rationale: Option<String>,
    /// Expected to be a JSON object of scalars.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl RawAgentOutput {
    /// Start a well-formed raw output for agents written in Rust.
    pub fn new(agent_id: impl Into<String>, role: AgentRole, action: AgentAction) -> Self {
        Self {
            agent_id: agent_id.into(),
            role: Some(role.as_str().to_string()),
            action: Some(action.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction.as_str().to_string());
        self
    }

    /// Confidence is carried as a decimal string so no precision is lost.
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = Some(serde_json::Value::String(confidence.to_string()));
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut map = match self.metadata.take() {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        map.insert(key.into(), value);
        self.metadata = Some(serde_json::Value::Object(map));
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Execution,
}

/// Record of an agent that produced no output this cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentFailure {
    pub agent_id: String,
    pub kind: FailureKind,
    #[serde(default)]
    pub message: String,
}

impl AgentFailure {
    pub fn timeout(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            kind: FailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn execution(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            kind: FailureKind::Execution,
            message: message.into(),
        }
    }
}

impl fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            FailureKind::Timeout => "timed out",
            FailureKind::Execution => "execution failed",
        };
        if self.message.is_empty() {
            f.write_str(label)
        } else {
            write!(f, "{label}: {}", self.message)
        }
    }
}

/// A submission that could not be read as either a completed output or a
/// failure, such as a non-string `role` or a missing `status` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MalformedSubmission {
    /// Taken from the submission when it carries a string `agent_id`.
    #[serde(default)]
    pub agent_id: String,
    pub reason: String,
}

/// One agent's contribution to a cycle: either its raw output or the reason
/// it has none.
///
/// Deserialization never fails for a single JSON value: anything that does
/// not fit `completed` or `failed` becomes [`AgentSubmission::Malformed`] so
/// the rest of the cycle still aggregates.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentSubmission {
    Completed(RawAgentOutput),
    Failed(AgentFailure),
    Malformed(MalformedSubmission),
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum TaggedSubmission {
    Completed(RawAgentOutput),
    Failed(AgentFailure),
    Malformed(MalformedSubmission),
}

impl<'de> Deserialize<'de> for AgentSubmission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let agent_id = value
            .get("agent_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(match serde_json::from_value(value) {
            Ok(TaggedSubmission::Completed(raw)) => AgentSubmission::Completed(raw),
            Ok(TaggedSubmission::Failed(failure)) => AgentSubmission::Failed(failure),
            Ok(TaggedSubmission::Malformed(malformed)) => AgentSubmission::Malformed(malformed),
            Err(e) => AgentSubmission::Malformed(MalformedSubmission {
                agent_id,
                reason: e.to_string(),
            }),
        })
    }
}

impl AgentSubmission {
    pub fn agent_id(&self) -> &str {
        match self {
            AgentSubmission::Completed(raw) => &raw.agent_id,
            AgentSubmission::Failed(failure) => &failure.agent_id,
            AgentSubmission::Malformed(malformed) => &malformed.agent_id,
        }
    }
}

impl From<RawAgentOutput> for AgentSubmission {
    fn from(raw: RawAgentOutput) -> Self {
        AgentSubmission::Completed(raw)
    }
}

impl From<AgentFailure> for AgentSubmission {
    fn from(failure: AgentFailure) -> Self {
        AgentSubmission::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn enums_use_uppercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&AgentRole::Guardrail).unwrap(),
            "\"GUARDRAIL\""
        );
        assert_eq!(
            serde_json::to_string(&AgentAction::NoTrade).unwrap(),
            "\"NO_TRADE\""
        );
        assert_eq!(serde_json::to_string(&Direction::No).unwrap(), "\"NO\"");
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!(AgentRole::parse("DIRECTIONAL"), Some(AgentRole::Directional));
        assert_eq!(AgentRole::parse("directional"), None);
        assert_eq!(AgentAction::parse("ABSTAIN"), Some(AgentAction::Abstain));
        assert_eq!(AgentAction::parse("SELL"), None);
        assert_eq!(Direction::parse(" YES"), None);
    }

    #[test]
    fn builder_produces_wire_strings() {
        let raw = RawAgentOutput::new("pricing", AgentRole::Directional, AgentAction::Buy)
            .with_direction(Direction::Yes)
            .with_confidence(dec!(0.65))
            .with_metadata("gap", serde_json::json!(0.07));

        assert_eq!(raw.role.as_deref(), Some("DIRECTIONAL"));
        assert_eq!(raw.action.as_deref(), Some("BUY"));
        assert_eq!(raw.direction.as_deref(), Some("YES"));
        assert_eq!(raw.confidence, Some(serde_json::json!("0.65")));
        assert_eq!(raw.metadata, Some(serde_json::json!({"gap": 0.07})));
    }

    #[test]
    fn submission_is_tagged_by_status() {
        let json = r#"[
            {"status": "completed", "agent_id": "risk", "role": "GUARDRAIL",
             "action": "NO_TRADE", "confidence": 0.0, "rationale": "spread too wide"},
            {"status": "failed", "agent_id": "rules", "kind": "timeout", "message": "30s"}
        ]"#;

        let parsed: Vec<AgentSubmission> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].agent_id(), "risk");
        match &parsed[1] {
            AgentSubmission::Failed(failure) => assert_eq!(failure.kind, FailureKind::Timeout),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn malformed_fields_still_deserialize() {
        // Wrong types inside the loosely-typed fields are left for validation.
        let json = r#"{"status": "completed", "agent_id": "x", "role": "ORACLE",
                       "confidence": "high", "metadata": [1, 2]}"#;
        let parsed: AgentSubmission = serde_json::from_str(json).unwrap();
        match parsed {
            AgentSubmission::Completed(raw) => {
                assert_eq!(raw.role.as_deref(), Some("ORACLE"));
                assert!(raw.action.is_none());
                assert_eq!(raw.metadata, Some(serde_json::json!([1, 2])));
            }
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[test]
    fn wrongly_typed_field_becomes_malformed() {
        let json = r#"[
            {"status": "completed", "agent_id": "rules_agent", "role": 7, "action": "ABSTAIN"},
            {"agent_id": "risk_agent", "role": "GUARDRAIL", "action": "ABSTAIN"},
            {"status": "failed", "agent_id": "news", "kind": "crashed"},
            {"status": "completed", "agent_id": "pricing", "role": "DIRECTIONAL",
             "action": "BUY", "direction": "YES", "confidence": 0.6}
        ]"#;

        let parsed: Vec<AgentSubmission> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 4);
        for (submission, id) in parsed.iter().zip(["rules_agent", "risk_agent", "news"]) {
            match submission {
                AgentSubmission::Malformed(m) => {
                    assert_eq!(m.agent_id, id);
                    assert!(!m.reason.is_empty());
                }
                other => panic!("expected malformed, got {other:?}"),
            }
        }
        assert!(matches!(parsed[3], AgentSubmission::Completed(_)));
    }

    #[test]
    fn malformed_without_string_id_has_empty_id() {
        let parsed: AgentSubmission =
            serde_json::from_str(r#"{"status": "completed", "agent_id": 12}"#).unwrap();
        assert_eq!(parsed.agent_id(), "");
    }

    #[test]
    fn malformed_submission_round_trips() {
        let malformed = AgentSubmission::Malformed(MalformedSubmission {
            agent_id: "rules_agent".to_string(),
            reason: "missing field `status`".to_string(),
        });
        let json = serde_json::to_string(&malformed).unwrap();
        assert!(json.contains(r#""status":"malformed""#));
        let parsed: AgentSubmission = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, malformed);
    }

    #[test]
    fn failure_display() {
        assert_eq!(
            AgentFailure::timeout("rules", "after 30s").to_string(),
            "timed out: after 30s"
        );
        assert_eq!(
            AgentFailure::execution("rules", "").to_string(),
            "execution failed"
        );
    }
}
