//! Permissive parsing of model replies into name lists
//!
//! Models are asked for a literal list of menu names but answer in many
//! dialects: JSON, Python literals, bracketed prose, or bare lines. Each
//! reader below is tried in order until one yields a non-empty list.

use crate::core::error::{MenuError, Result};
use nom::branch::alt;
use nom::bytes::complete::take_while;
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, opt, recognize};
use nom::multi::separated_list0;
use nom::sequence::{delimited, terminated};
use nom::{IResult, Parser};
use serde_json::Value;

/// Which reader produced the token list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Json,
    Literal,
    Bracketed,
    Delimited,
}

/// Tokens read from a reply, plus the cleaned text for a last-resort scan
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub tokens: Vec<String>,
    pub format: Option<ReplyFormat>,
    pub text: String,
}

/// Remove lines that open or close a markdown code fence
pub fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract JSON object from LLM response (handles surrounding text)
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| MenuError::LlmError("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| MenuError::LlmError("No closing brace found in response".into()))?;
    response
        .get(start..=end)
        .ok_or_else(|| MenuError::LlmError("Malformed JSON bounds in response".into()))
}

fn value_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// `["a", "b"]` or `{"items": ["a", "b"]}`
pub fn parse_json_list(text: &str) -> Option<Vec<String>> {
    let parsed: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(extract_json(text).ok()?).ok()?,
    };
    let items = match &parsed {
        Value::Array(items) => items,
        Value::Object(map) => map.get("items")?.as_array()?,
        _ => return None,
    };
    Some(items.iter().map(value_token).collect())
}

fn quoted(input: &str) -> IResult<&str, String> {
    alt((
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
    ))
    .map(|s: &str| s.trim().to_string())
    .parse(input)
}

fn integer(input: &str) -> IResult<&str, String> {
    recognize((opt(char('-')), digit1))
        .map(str::to_string)
        .parse(input)
}

fn literal_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        (multispace0, char('['), multispace0),
        terminated(
            separated_list0((multispace0, char(','), multispace0), alt((quoted, integer))),
            (multispace0, opt(char(',')), multispace0),
        ),
        (char(']'), multispace0),
    )
    .parse(input)
}

/// Python-style literal list: `['a', "b", 3]`
pub fn parse_literal_list(text: &str) -> Option<Vec<String>> {
    all_consuming(literal_list)
        .parse(text)
        .ok()
        .map(|(_, items)| items)
}

fn is_list_delimiter(c: char) -> bool {
    matches!(c, ',' | '，' | '、' | ';' | '；' | '\n')
}

fn clean_token(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace())
        .to_string()
}

/// Content of the first `[...]`, split on list delimiters
pub fn parse_bracketed(text: &str) -> Option<Vec<String>> {
    let start = text.find('[')?;
    let rest = text.get(start + 1..)?;
    let end = rest.find(']')?;
    let inner = rest.get(..end)?;
    Some(
        inner
            .split(is_list_delimiter)
            .filter(|part| !part.trim().is_empty())
            .map(clean_token)
            .collect(),
    )
}

/// Whole text split on list delimiters and tabs
pub fn split_delimited(text: &str) -> Vec<String> {
    text.split(|c: char| is_list_delimiter(c) || c == '\t')
        .filter(|part| !part.trim().is_empty())
        .map(clean_token)
        .collect()
}

/// Run every reader in order and keep the first non-empty token list
pub fn parse_reply(reply: &str) -> ParsedReply {
    let text = strip_code_fences(reply);

    let non_empty = |tokens: Vec<String>| -> Option<Vec<String>> {
        let tokens: Vec<String> = tokens.into_iter().filter(|t| !t.is_empty()).collect();
        (!tokens.is_empty()).then_some(tokens)
    };

    let attempts: [(ReplyFormat, Option<Vec<String>>); 4] = [
        (ReplyFormat::Json, parse_json_list(&text)),
        (ReplyFormat::Literal, parse_literal_list(&text)),
        (ReplyFormat::Bracketed, parse_bracketed(&text)),
        (ReplyFormat::Delimited, Some(split_delimited(&text))),
    ];

    for (format, tokens) in attempts {
        if let Some(tokens) = tokens.and_then(non_empty) {
            return ParsedReply {
                tokens,
                format: Some(format),
                text,
            };
        }
    }

    ParsedReply {
        tokens: Vec::new(),
        format: None,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here you go: {\"items\": [\"Stalls\"]} hope that helps";
        assert_eq!(extract_json(response).unwrap(), "{\"items\": [\"Stalls\"]}");
    }

    #[test]
    fn test_extract_json_no_json() {
        assert!(extract_json("I don't understand that command").is_err());
    }

    #[test]
    fn test_json_list() {
        let reply = parse_reply("[\"Stalls\", \" Dishes \"]");
        assert_eq!(reply.format, Some(ReplyFormat::Json));
        assert_eq!(reply.tokens, vec!["Stalls", "Dishes"]);
    }

    #[test]
    fn test_json_items_object() {
        let reply = parse_reply("{\"items\": [\"Stalls\"]}");
        assert_eq!(reply.format, Some(ReplyFormat::Json));
        assert_eq!(reply.tokens, vec!["Stalls"]);
    }

    #[test]
    fn test_python_literal_list() {
        let reply = parse_reply("['Stalls', 'Dishes',]");
        assert_eq!(reply.format, Some(ReplyFormat::Literal));
        assert_eq!(reply.tokens, vec!["Stalls", "Dishes"]);
    }

    #[test]
    fn test_literal_list_with_numbers() {
        assert_eq!(
            parse_literal_list(" [ 'a' , -3 ] "),
            Some(vec!["a".to_string(), "-3".to_string()])
        );
        assert_eq!(parse_literal_list("['a' 'b']"), None);
    }

    #[test]
    fn test_code_fenced_reply() {
        let reply = parse_reply("```python\n['档口管理']\n```");
        assert_eq!(reply.tokens, vec!["档口管理"]);
        assert_eq!(reply.text, "['档口管理']");
    }

    #[test]
    fn test_bracketed_prose() {
        let reply = parse_reply("The best matches are [Stalls、Dishes] in my view");
        assert_eq!(reply.format, Some(ReplyFormat::Bracketed));
        assert_eq!(reply.tokens, vec!["Stalls", "Dishes"]);
    }

    #[test]
    fn test_bare_lines() {
        let reply = parse_reply("Stalls\n\"Dishes\"\tMenus");
        assert_eq!(reply.format, Some(ReplyFormat::Delimited));
        assert_eq!(reply.tokens, vec!["Stalls", "Dishes", "Menus"]);
    }

    #[test]
    fn test_empty_reply() {
        let reply = parse_reply("   ");
        assert!(reply.tokens.is_empty());
        assert_eq!(reply.format, None);
    }
}
