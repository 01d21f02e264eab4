//! Inbound commands emitted by the lobby UI.

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Game, GameRequest, Player};

/// A UI-originated request for a store write.
///
/// Wire form is `{"type": "<command>", "payload": ...}` with camelCase
/// command names matching the UI's outgoing ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    /// Publish a new game; answered with `gameOpened`.
    OpenGame(Game),
    /// Replace a game wholesale; the game must carry its id.
    ChangeGame(Game),
    /// Register the local player. Older UIs send `registerLocalPlayer`.
    #[serde(alias = "registerLocalPlayer")]
    RegisterPlayer(Player),
    RequestToJoinGame(GameRequest),
    WatchGame(GameRequest),
    /// Graceful end of a game: disarms its abandon-on-disconnect hook.
    FinishGame(String),
    SendChat(ChatMessage),
}

impl Command {
    /// Stable camelCase name, used as the log label and in failure events.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenGame(_) => "openGame",
            Self::ChangeGame(_) => "changeGame",
            Self::RegisterPlayer(_) => "registerPlayer",
            Self::RequestToJoinGame(_) => "requestToJoinGame",
            Self::WatchGame(_) => "watchGame",
            Self::FinishGame(_) => "finishGame",
            Self::SendChat(_) => "sendChat",
        }
    }
}
