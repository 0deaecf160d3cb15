use quorum_models::AgentAction;
use rust_decimal::Decimal;
use thiserror::Error;

/// A raw agent result that violates the output schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("agent_id is missing")]
    MissingAgentId,

    #[error("role is missing")]
    MissingRole,

    #[error("unknown role: {0:?}")]
    UnknownRole(String),

    #[error("action is missing")]
    MissingAction,

    #[error("unknown action: {0:?}")]
    UnknownAction(String),

    #[error("unknown direction: {0:?}")]
    UnknownDirection(String),

    #[error("direction is required when action is BUY")]
    MissingDirection,

    #[error("direction must be absent when action is {0}")]
    UnexpectedDirection(AgentAction),

    #[error("guardrail agents cannot emit BUY")]
    GuardrailBuy,

    #[error("confidence is missing")]
    MissingConfidence,

    #[error("confidence is not a decimal number: {0}")]
    InvalidConfidence(String),

    #[error("confidence {0} has more digits than can be represented exactly")]
    InexactConfidence(String),

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(Decimal),

    #[error("rationale is required when action is NO_TRADE")]
    MissingRationale,

    #[error("metadata must be an object, got {0}")]
    InvalidMetadata(String),

    #[error("metadata value for {0:?} is not a scalar")]
    NonScalarMetadata(String),
}

/// Misuse of the aggregator entry point by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mandatory guardrail id is empty")]
    EmptyMandatoryId,

    #[error("mandatory guardrail id {0:?} has surrounding whitespace")]
    UntrimmedMandatoryId(String),
}
