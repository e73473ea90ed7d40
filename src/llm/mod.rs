//! Remote chat-completion model access

pub mod client;
pub mod parser;

pub use client::{ApiFormat, CompletionClient, LlmClient};
pub use parser::{parse_reply, ParsedReply, ReplyFormat};
