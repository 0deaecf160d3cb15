use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;

/// An external program that acts as an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl AgentCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Run the command with `input` on stdin and return its stdout.
///
/// The child is killed if the returned future is dropped, so a caller-side
/// timeout also stops the process.
pub async fn run_agent_command(command: &AgentCommand, input: &str) -> Result<String, AgentError> {
    debug!(program = %command.program, "Running agent command");

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AgentError::Command(format!("Failed to spawn {}: {e}", command.program)))?;

    if let Some(mut stdin) = child.stdin.take() {
        // An agent that exits without reading its input is not an error here;
        // its exit status and stdout decide.
        match stdin.write_all(input.as_bytes()).await {
            Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }
    }

    let output = child.wait_with_output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(program = %command.program, status = %output.status, stderr = %stderr, "Agent command failed");
        return Err(AgentError::Command(format!(
            "{} exited {}: {}",
            command.program,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(AgentError::Command(format!(
            "{} produced no output",
            command.program
        )));
    }

    Ok(stdout)
}
