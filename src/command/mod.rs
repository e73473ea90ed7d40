//! Command pipeline
//!
//! CommandRequest -> CommandOrchestrator -> CommandOutcome -> CommandResponse

pub mod orchestrator;
pub mod resolver;
pub mod response;

pub use orchestrator::{
    resolve_identity, CommandOrchestrator, CommandOutcome, CommandRequest, CommandResult,
    FailureKind, Stage,
};
pub use resolver::{PathSource, Resolution, TargetMatch, TargetResolver};
pub use response::{CommandResponse, TargetObject};
