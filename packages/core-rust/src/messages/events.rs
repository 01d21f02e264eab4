//! Outbound events delivered to the lobby UI.
//!
//! Two families share one enum: acknowledgements (exactly one per
//! command, success or `commandFailed`) and change-feed notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Player;

/// Acknowledgement for a join or watch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAck {
    pub game_id: String,
    /// Push id of the appended player reference.
    pub request_id: String,
}

/// Failure report for a command that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailure {
    /// Name of the failed command, e.g. `"openGame"`.
    pub command: String,
    pub reason: String,
}

/// Relay-originated message for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum UiEvent {
    // --- acknowledgements ---
    /// `openGame` stored; carries the new game id.
    GameOpened(String),
    /// `changeGame` stored; carries the game id.
    GameUpdated(String),
    /// `registerPlayer` stored; the player now carries its id.
    PlayerRegistered(Player),
    JoinRequested(RequestAck),
    WatchRequested(RequestAck),
    /// `finishGame` processed; carries the game id.
    GameFinished(String),
    /// `sendChat` stored; carries the message id.
    ChatSent(String),
    CommandFailed(CommandFailure),

    // --- change feed ---
    // Records pass through as stored, with `id` merged in; nothing here
    // assumes they decode as a `Game`.
    GameAdded(Value),
    GameChanged(Value),
    OpenGameAdded(Value),
    OpenGameRemoved(String),
    RunningGameAdded(Value),
    RunningGameRemoved(String),
}

impl UiEvent {
    /// `true` for events that answer a command.
    #[must_use]
    pub fn is_acknowledgement(&self) -> bool {
        matches!(
            self,
            Self::GameOpened(_)
                | Self::GameUpdated(_)
                | Self::PlayerRegistered(_)
                | Self::JoinRequested(_)
                | Self::WatchRequested(_)
                | Self::GameFinished(_)
                | Self::ChatSent(_)
                | Self::CommandFailed(_)
        )
    }
}
