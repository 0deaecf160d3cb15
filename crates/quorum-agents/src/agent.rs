use async_trait::async_trait;
use quorum_models::{AgentConfig, AgentRole, MarketSnapshot, RawAgentOutput};

use crate::command::{run_agent_command, AgentCommand};
use crate::error::AgentError;
use crate::parser::parse_raw_output;

/// One decision agent. Mockable for testing.
///
/// Implementations return the raw output as produced; schema validation is
/// the aggregator's job.
#[async_trait]
pub trait DecisionAgent: Send + Sync {
    fn id(&self) -> &str;
    fn role(&self) -> AgentRole;

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<RawAgentOutput, AgentError>;
}

/// An agent implemented as an external command: snapshot JSON in on stdin,
/// agent output JSON out on stdout.
pub struct CommandAgent {
    pub id: String,
    pub role: AgentRole,
    pub command: AgentCommand,
}

impl CommandAgent {
    pub fn new(id: impl Into<String>, role: AgentRole, command: AgentCommand) -> Self {
        Self {
            id: id.into(),
            role,
            command,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            config.id.clone(),
            config.role,
            AgentCommand::new(config.command.clone(), config.args.clone()),
        )
    }
}

#[async_trait]
impl DecisionAgent for CommandAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> AgentRole {
        self.role
    }

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<RawAgentOutput, AgentError> {
        let input = serde_json::to_string(snapshot)?;
        let stdout = run_agent_command(&self.command, &input).await?;
        let mut raw = parse_raw_output(&stdout)?;
        if raw.agent_id.is_empty() {
            raw.agent_id = self.id.clone();
        }
        Ok(raw)
    }
}
