//! Remote-model strategy: ask a chat model to pick leaf names

use crate::core::error::Result;
use crate::core::types::char_len;
use crate::llm::client::CompletionClient;
use crate::llm::parser::parse_reply;

const MATCH_SYSTEM_PROMPT: &str = "You map a user's request onto entries of an application menu. \
Answer only with a Python list literal of one or more menu names copied exactly from the list \
you are given, most relevant first. Do not explain and do not invent names.";

fn user_prompt(utterance: &str, leaves: &[String]) -> String {
    let quoted: Vec<String> = leaves.iter().map(|leaf| format!("'{}'", leaf)).collect();
    format!(
        "MENU ENTRIES:\n[{}]\n\nUSER INPUT:\n{}\n\nReturn the matching menu names as a list:",
        quoted.join(", "),
        utterance
    )
}

/// Resolve reply tokens against known leaves.
///
/// Exact name first, then containment either way for tokens of two or more
/// characters (in token order), then any leaf name appearing in the raw text.
pub fn resolve_tokens(tokens: &[String], raw: &str, leaves: &[String]) -> Option<String> {
    if let Some(token) = tokens.iter().find(|token| leaves.contains(*token)) {
        return Some(token.clone());
    }

    for token in tokens.iter().filter(|token| char_len(token) >= 2) {
        if let Some(leaf) = leaves
            .iter()
            .find(|leaf| leaf.contains(token.as_str()) || token.contains(leaf.as_str()))
        {
            return Some(leaf.clone());
        }
    }

    leaves
        .iter()
        .find(|leaf| !leaf.is_empty() && raw.contains(leaf.as_str()))
        .cloned()
}

/// Ask the model; at most one leaf comes back
pub async fn remote_match(
    client: &dyn CompletionClient,
    utterance: &str,
    leaves: &[String],
) -> Result<Vec<String>> {
    if leaves.is_empty() {
        return Ok(Vec::new());
    }

    let reply = client
        .complete(MATCH_SYSTEM_PROMPT, &user_prompt(utterance, leaves))
        .await?;
    let parsed = parse_reply(&reply);
    tracing::debug!(format = ?parsed.format, tokens = parsed.tokens.len(), "Parsed model reply");

    Ok(resolve_tokens(&parsed.tokens, &parsed.text, leaves)
        .into_iter()
        .collect())
}
