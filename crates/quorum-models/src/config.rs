use serde::{Deserialize, Serialize};

use crate::agent_output::AgentRole;

/// Top-level configuration for quorum.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuorumConfig {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
}

/// How equal directional scores are resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// A tie is insufficient evidence: no recommendation.
    #[default]
    NoSignal,
    /// The side of the earliest BUY vote in submission order wins.
    FirstSubmitted,
}

/// Policy knobs for the aggregation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregationConfig {
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Guardrails whose absence forces NO_TRADE.
    #[serde(default)]
    pub mandatory_guardrails: Vec<String>,
}

/// Configuration for running agents each cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentsConfig {
    /// Per-agent timeout in seconds. A late agent is recorded as timed out.
    #[serde(default = "default_agent_timeout_seconds")]
    pub agent_timeout_seconds: u64,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

fn default_agent_timeout_seconds() -> u64 {
    30
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            agent_timeout_seconds: default_agent_timeout_seconds(),
            agents: Vec::new(),
        }
    }
}

/// An agent run as an external command that reads the market snapshot JSON
/// on stdin and prints its output JSON on stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub id: String,
    pub role: AgentRole,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: QuorumConfig = toml::from_str("").unwrap();
        assert_eq!(config, QuorumConfig::default());
        assert_eq!(config.aggregation.tie_break, TieBreak::NoSignal);
        assert_eq!(config.agents.agent_timeout_seconds, 30);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[aggregation]
tie_break = "first_submitted"
mandatory_guardrails = ["rules_agent"]

[agents]
agent_timeout_seconds = 10

[[agents.agents]]
id = "rules_agent"
role = "GUARDRAIL"
command = "python3"
args = ["-m", "agents.rules"]

[[agents.agents]]
id = "news_agent"
role = "DIRECTIONAL"
command = "./news.sh"
enabled = false
"#;

        let config: QuorumConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.aggregation.tie_break, TieBreak::FirstSubmitted);
        assert_eq!(config.aggregation.mandatory_guardrails, vec!["rules_agent"]);
        assert_eq!(config.agents.agent_timeout_seconds, 10);
        assert_eq!(config.agents.agents.len(), 2);
        assert_eq!(config.agents.agents[0].role, AgentRole::Guardrail);
        assert!(config.agents.agents[0].enabled);
        assert!(!config.agents.agents[1].enabled);
        assert!(config.agents.agents[1].args.is_empty());
    }

    #[test]
    fn sample_config_parses() {
        let sample = include_str!("../../../config/quorum.toml");
        let config: QuorumConfig = toml::from_str(sample).unwrap();
        assert!(!config.agents.agents.is_empty());
        for id in &config.aggregation.mandatory_guardrails {
            assert!(
                config
                    .agents
                    .agents
                    .iter()
                    .any(|a| &a.id == id && a.role == AgentRole::Guardrail),
                "mandatory guardrail {id} is not a configured guardrail"
            );
        }
    }

    #[test]
    fn unknown_tie_break_is_rejected() {
        let result: Result<QuorumConfig, _> =
            toml::from_str("[aggregation]\ntie_break = \"coin_flip\"\n");
        assert!(result.is_err());
    }
}
