pub mod agent;
pub mod collector;
pub mod command;
pub mod error;
pub mod parser;

pub mod test_support;

pub use agent::{CommandAgent, DecisionAgent};
pub use collector::Collector;
pub use command::AgentCommand;
pub use error::AgentError;
