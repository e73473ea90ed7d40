//! Menu Intent - natural-language navigation over permission-scoped menus

pub mod catalog;
pub mod command;
pub mod core;
pub mod keywords;
pub mod llm;
pub mod matcher;
pub mod permission;
pub mod realtime;
pub mod server;
