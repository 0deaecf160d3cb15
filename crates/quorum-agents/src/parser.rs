use quorum_models::RawAgentOutput;

use crate::error::AgentError;

/// Pull the first JSON object out of agent stdout.
///
/// Agents backed by an LLM often wrap their answer:
/// - bare JSON: `{"action": "ABSTAIN", ...}`
/// - a fenced block: ```json\n{...}\n```
/// - prose around it: `Here is my verdict: {...}`
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    let candidates = [
        Some(trimmed.to_string()).filter(|t| t.starts_with('{')),
        fenced_block(trimmed),
        first_balanced_object(trimmed),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|candidate| serde_json::from_str::<serde_json::Value>(candidate).is_ok())
        .ok_or_else(|| {
            AgentError::Parse(format!(
                "No JSON object found in agent output (length={})",
                text.len()
            ))
        })
}

fn fenced_block(text: &str) -> Option<String> {
    const OPENERS: [&str; 4] = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    OPENERS.iter().find_map(|opener| {
        let body_start = text.find(opener)? + opener.len();
        let body_len = text[body_start..].find("```")?;
        Some(text[body_start..body_start + body_len].trim().to_string())
    })
}

/// The first `{ ... }` with balanced braces, ignoring braces inside strings.
fn first_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse agent stdout into a raw output. Schema checks happen later, in the
/// aggregator.
pub fn parse_raw_output(stdout: &str) -> Result<RawAgentOutput, AgentError> {
    let json = extract_json(stdout)?;
    serde_json::from_str(&json)
        .map_err(|e| AgentError::Parse(format!("Not an agent output object: {e}")))
}
