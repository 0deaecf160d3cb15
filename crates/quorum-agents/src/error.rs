use quorum_models::FailureKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent command error: {0}")]
    Command(String),

    #[error("Agent output parse error: {0}")]
    Parse(String),

    #[error("Agent timed out after {0} ms")]
    Timeout(u64),

    #[error("Agent configuration error: {0}")]
    Config(String),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] quorum_engine::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// How this error is reported to the aggregator.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AgentError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Execution,
        }
    }
}
