//! Wire form of a command outcome

use crate::command::orchestrator::{CommandOutcome, CommandResult};
use crate::realtime::protocol::OPEN_ACTION;
use crate::realtime::ServerMessage;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_targets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_target_objects: Option<Vec<TargetObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_data: Option<ServerMessage>,
    pub timestamp: String,
}

/// One disambiguation choice
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetObject {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Stringified for the client
    pub action_id: String,
    pub timestamp: String,
    /// Bare leaf name; the full path is in `multipleTargets`
    pub name: String,
    pub parent_name: Option<String>,
}

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        let success = outcome.is_success();
        let mut response = CommandResponse {
            success,
            message: outcome.message,
            single_target: None,
            multiple_targets: None,
            multiple_target_objects: None,
            message_data: None,
            timestamp: outcome.timestamp,
        };

        match outcome.result {
            CommandResult::NoMatch(_) => {}
            CommandResult::SingleMatch { full_path, .. } => {
                response.single_target = Some(full_path);
                response.message_data = outcome.pushed;
            }
            CommandResult::MultipleMatches(targets) => {
                response.multiple_targets =
                    Some(targets.iter().map(|t| t.full_path.clone()).collect());
                response.multiple_target_objects = Some(
                    targets
                        .into_iter()
                        .map(|t| TargetObject {
                            kind: OPEN_ACTION,
                            action_id: t.action_id.to_string(),
                            timestamp: response.timestamp.clone(),
                            name: t.leaf_name,
                            parent_name: t.parent_name,
                        })
                        .collect(),
                );
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::orchestrator::FailureKind;
    use crate::command::resolver::{PathSource, TargetMatch};
    use serde_json::json;

    fn outcome(result: CommandResult, pushed: Option<ServerMessage>) -> CommandOutcome {
        CommandOutcome {
            identity: "1".into(),
            result,
            message: "m".into(),
            pushed,
            delivered: false,
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn test_no_match_has_only_base_fields() {
        let response: CommandResponse =
            outcome(CommandResult::NoMatch(FailureKind::NoMatch), None).into();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "message": "m", "timestamp": "2026-01-01T00:00:00.000Z"})
        );
    }

    #[test]
    fn test_single_match_carries_pushed_frame() {
        let pushed = ServerMessage::open_action("A-B", "1", 9, "t");
        let response: CommandResponse = outcome(
            CommandResult::SingleMatch {
                full_path: "A-B".into(),
                action_id: 9,
            },
            Some(pushed),
        )
        .into();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["singleTarget"], "A-B");
        assert_eq!(value["messageData"]["data"]["actionId"], 9);
        assert!(value.get("multipleTargets").is_none());
    }

    #[test]
    fn test_multiple_match_objects() {
        let target = |path: &str, id| TargetMatch {
            leaf_name: path.rsplit('-').next().unwrap_or(path).to_string(),
            full_path: path.to_string(),
            action_id: id,
            parent_name: path.split_once('-').map(|(p, _)| p.to_string()),
            path_source: PathSource::Recorded,
        };
        let response: CommandResponse = outcome(
            CommandResult::MultipleMatches(vec![target("Canteen-Stalls", 1), target("Orphan", -1)]),
            None,
        )
        .into();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["multipleTargets"], json!(["Canteen-Stalls", "Orphan"]));
        assert_eq!(
            value["multipleTargetObjects"][0],
            json!({
                "type": "open_action",
                "actionId": "1",
                "timestamp": "2026-01-01T00:00:00.000Z",
                "name": "Stalls",
                "parentName": "Canteen"
            })
        );
        assert_eq!(value["multipleTargetObjects"][1]["name"], "Orphan");
        assert_eq!(value["multipleTargetObjects"][1]["actionId"], "-1");
        assert_eq!(value["multipleTargetObjects"][1]["parentName"], json!(null));
    }
}
