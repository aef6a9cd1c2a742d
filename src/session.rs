//! Session state and the reducer that owns all of its mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::erp::ResponseEnvelope;
use crate::intent::ParsedCommand;

/// Lifecycle of a single voice command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Executing,
    Success,
    Error,
}

/// One entry in the command history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    pub original_text: String,
    pub parsed_command: ParsedCommand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResponseEnvelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: CommandStatus,
}

impl Command {
    /// Create a pending command for the given transcript
    #[must_use]
    pub fn new(original_text: String, parsed_command: ParsedCommand) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original_text,
            parsed_command,
            result: None,
            error: None,
            timestamp: Utc::now(),
            status: CommandStatus::Pending,
        }
    }
}

/// Snapshot of the voice-command session
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_listening: bool,
    pub is_initializing: bool,
    /// Command history, newest first
    pub commands: Vec<Command>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_command_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State transitions applied by [`reduce`]
#[derive(Debug, Clone)]
pub enum Action {
    StartListening,
    StopListening,
    SetInitializing(bool),
    AddCommand(Command),
    UpdateCommand {
        id: String,
        status: Option<CommandStatus>,
        result: Option<ResponseEnvelope>,
        error: Option<String>,
    },
    SetError(String),
    ClearError,
    ClearCommands,
}

/// Apply one action to the session state
///
/// Command patches are keyed by id; a patch for an unknown id leaves the
/// state untouched.
pub fn reduce(state: &mut SessionState, action: Action) {
    match action {
        Action::StartListening => {
            state.is_listening = true;
            state.error = None;
        }
        Action::StopListening => state.is_listening = false,
        Action::SetInitializing(value) => state.is_initializing = value,
        Action::AddCommand(command) => {
            state.current_command_id = Some(command.id.clone());
            state.commands.insert(0, command);
            state.error = None;
        }
        Action::UpdateCommand {
            id,
            status,
            result,
            error,
        } => {
            if let Some(command) = state.commands.iter_mut().find(|c| c.id == id) {
                if let Some(status) = status {
                    command.status = status;
                }
                if let Some(result) = result {
                    command.result = Some(result);
                }
                if let Some(error) = error {
                    command.error = Some(error);
                }
            }
        }
        Action::SetError(message) => state.error = Some(message),
        Action::ClearError => state.error = None,
        Action::ClearCommands => {
            state.commands.clear();
            state.current_command_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::intent::classify;

    fn command(text: &str) -> Command {
        Command::new(text.to_string(), classify(text))
    }

    #[test]
    fn test_add_command_prepends_and_clears_error() {
        let mut state = SessionState::default();
        reduce(&mut state, Action::SetError("خطأ قديم".to_string()));

        let first = command("كم مبيعات اليوم");
        let second = command("اعرض الفواتير غير المدفوعة");
        let second_id = second.id.clone();

        reduce(&mut state, Action::AddCommand(first));
        reduce(&mut state, Action::AddCommand(second));

        assert_eq!(state.commands.len(), 2);
        assert_eq!(state.commands[0].id, second_id);
        assert_eq!(state.current_command_id, Some(second_id));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_update_command_patches_only_the_matching_entry() {
        let mut state = SessionState::default();
        let first = command("كم مبيعات اليوم");
        let second = command("المنتجات الناقصة");
        let first_id = first.id.clone();

        reduce(&mut state, Action::AddCommand(first));
        reduce(&mut state, Action::AddCommand(second));
        reduce(
            &mut state,
            Action::UpdateCommand {
                id: first_id.clone(),
                status: Some(CommandStatus::Success),
                result: Some(ResponseEnvelope::success(json!({"count": 3}))),
                error: None,
            },
        );

        let patched = state.commands.iter().find(|c| c.id == first_id).unwrap();
        assert_eq!(patched.status, CommandStatus::Success);
        assert!(patched.result.is_some());
        assert!(patched.error.is_none());
        assert_eq!(state.commands[0].status, CommandStatus::Pending);
    }

    #[test]
    fn test_update_for_unknown_id_is_a_no_op() {
        let mut state = SessionState::default();
        reduce(&mut state, Action::AddCommand(command("كم مبيعات اليوم")));

        let before = state.clone();
        reduce(
            &mut state,
            Action::UpdateCommand {
                id: "missing".to_string(),
                status: Some(CommandStatus::Error),
                result: None,
                error: Some("lost".to_string()),
            },
        );

        assert_eq!(state.commands, before.commands);
        assert_eq!(state.current_command_id, before.current_command_id);
    }

    #[test]
    fn test_listening_transitions() {
        let mut state = SessionState::default();
        reduce(&mut state, Action::SetError("تعذر الاستماع".to_string()));

        reduce(&mut state, Action::StartListening);
        assert!(state.is_listening);
        assert!(state.error.is_none());

        reduce(&mut state, Action::SetError("انقطاع".to_string()));
        reduce(&mut state, Action::StopListening);
        assert!(!state.is_listening);
        assert_eq!(state.error.as_deref(), Some("انقطاع"));
    }

    #[test]
    fn test_clear_commands_resets_history_and_current() {
        let mut state = SessionState::default();
        reduce(&mut state, Action::AddCommand(command("كم مبيعات اليوم")));
        reduce(&mut state, Action::ClearCommands);

        assert!(state.commands.is_empty());
        assert!(state.current_command_id.is_none());
    }

    #[test]
    fn test_command_serializes_with_camel_case_keys() {
        let entry = command("كم مبيعات اليوم");
        let value = serde_json::to_value(&entry).unwrap();

        assert!(value.get("originalText").is_some());
        assert!(value.get("parsedCommand").is_some());
        assert_eq!(value["status"], "pending");
        assert!(value.get("result").is_none());
    }
}
