//! Deterministic aggregation of agent outputs into one trade recommendation.
//!
//! Pipeline: [`schema::validate`] every submission, fail safe on missing
//! mandatory guardrails, [`guardrail::evaluate_guardrails`] for vetoes,
//! [`voter::tally_votes`] for a side, [`confidence::combine_confidence`] for
//! the final confidence. [`Aggregator`] wires them together.

pub mod aggregator;
pub mod confidence;
pub mod error;
pub mod guardrail;
pub mod schema;
pub mod voter;

pub use aggregator::{aggregate, Aggregator};
pub use error::{ConfigError, ValidationError};
pub use guardrail::GuardrailVerdict;
pub use schema::{validate, AgentOutput};
pub use voter::{NoSignalReason, Vote};
