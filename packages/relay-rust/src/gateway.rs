//! Record gateway: named lobby operations mapped onto store writes.
//!
//! Every operation is one store call against the `games`, `players` or
//! `chat` collection. Failures are logged with the operation's label and
//! returned; nothing is retried.

use std::sync::Arc;

use lobby_core::types::{from_document, to_document};
use lobby_core::{status, ChatMessage, Game, GameRequest, PathError, Player, StorePath};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CollectionNames;
use crate::storage::{DisconnectAction, StoreError};
use crate::traits::DocumentStore;

/// Operation labels used in logs and errors.
pub mod operation {
    pub const OPEN: &str = "open";
    pub const UPDATE: &str = "update";
    pub const REQUEST_TO_JOIN: &str = "requestToJoinGame";
    pub const WATCH: &str = "watchGame";
    pub const REGISTER: &str = "register";
    pub const SEND: &str = "send";
    pub const ABANDON_ON_DISCONNECT: &str = "abandonOnDisconnect";
    pub const CANCEL_ABANDON_ON_DISCONNECT: &str = "cancelAbandonOnDisconnect";
    pub const DELETE_ON_DISCONNECT: &str = "deleteOnDisconnect";
    pub const READ: &str = "read";
}

const JOIN_REQUESTS: &str = "joinRequests";
const SPECTATORS: &str = "spectators";
const STATUS: &str = "status";

/// Gateway failure.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The store rejected or could not complete the call.
    #[error("{operation} failed: {source}")]
    StoreOperationFailed {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
    /// `update` was given a game without an id.
    #[error("game has no id")]
    MissingGameId,
    #[error("record encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// An id or collection name is not a valid path segment.
    #[error("invalid record path: {0}")]
    InvalidPath(#[from] PathError),
}

/// Typed access to the lobby collections of one store.
#[derive(Clone)]
pub struct RecordGateway {
    store: Arc<dyn DocumentStore>,
    collections: CollectionNames,
}

impl RecordGateway {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collections: CollectionNames) -> Self {
        Self { store, collections }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    #[must_use]
    pub fn collections(&self) -> &CollectionNames {
        &self.collections
    }

    /// Publishes a new game and returns its store-assigned id.
    ///
    /// Any `id` already on `game` is ignored.
    ///
    /// # Errors
    ///
    /// [`GatewayError::StoreOperationFailed`] if the push is rejected.
    pub async fn open(&self, game: &Game) -> Result<String, GatewayError> {
        let games = StorePath::parse(&self.collections.games)?;
        let id = self
            .store
            .push(&games, to_document(game)?)
            .await
            .map_err(store_failed(operation::OPEN, &games))?;
        debug!(operation = operation::OPEN, game_id = %id, "game opened");
        Ok(id)
    }

    /// Replaces `games/{game.id}` with `game`. Fields absent from `game`,
    /// join requests and spectators included, are gone afterwards.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MissingGameId`] without an id, otherwise store failures.
    pub async fn update(&self, game: &Game) -> Result<String, GatewayError> {
        let id = game.id.as_deref().ok_or(GatewayError::MissingGameId)?;
        let path = self.game_path(id)?;
        self.store
            .set(&path, to_document(game)?)
            .await
            .map_err(store_failed(operation::UPDATE, &path))?;
        debug!(operation = operation::UPDATE, game_id = %id, "game replaced");
        Ok(id.to_string())
    }

    /// Appends the player under `games/{gameId}/joinRequests`. Returns the
    /// push id of the request.
    ///
    /// # Errors
    ///
    /// Store failures, or an invalid game id.
    pub async fn request_to_join_game(&self, request: &GameRequest) -> Result<String, GatewayError> {
        self.append_player(operation::REQUEST_TO_JOIN, request, JOIN_REQUESTS)
            .await
    }

    /// Appends the player under `games/{gameId}/spectators`. Returns the
    /// push id of the request.
    ///
    /// # Errors
    ///
    /// Store failures, or an invalid game id.
    pub async fn watch_game(&self, request: &GameRequest) -> Result<String, GatewayError> {
        self.append_player(operation::WATCH, request, SPECTATORS).await
    }

    /// Registers a player and returns its store-assigned id.
    ///
    /// # Errors
    ///
    /// [`GatewayError::StoreOperationFailed`] if the push is rejected.
    pub async fn register_player(&self, player: &Player) -> Result<String, GatewayError> {
        let players = StorePath::parse(&self.collections.players)?;
        let id = self
            .store
            .push(&players, to_document(player)?)
            .await
            .map_err(store_failed(operation::REGISTER, &players))?;
        debug!(operation = operation::REGISTER, player_id = %id, "player registered");
        Ok(id)
    }

    /// Appends a chat message and returns its id.
    ///
    /// # Errors
    ///
    /// [`GatewayError::StoreOperationFailed`] if the push is rejected.
    pub async fn send_chat(&self, message: &ChatMessage) -> Result<String, GatewayError> {
        let chat = StorePath::parse(&self.collections.chat)?;
        let id = self
            .store
            .push(&chat, to_document(message)?)
            .await
            .map_err(store_failed(operation::SEND, &chat))?;
        debug!(operation = operation::SEND, message_id = %id, "chat message sent");
        Ok(id)
    }

    /// Arms `games/{gameId}/status = "Abandoned"` for when this client
    /// disconnects.
    ///
    /// # Errors
    ///
    /// Store failures, or an invalid game id.
    pub async fn abandon_on_disconnect(&self, game_id: &str) -> Result<(), GatewayError> {
        let path = self.game_path(game_id)?.child(STATUS)?;
        let action = DisconnectAction::Set(Value::from(status::ABANDONED));
        self.store
            .arm_on_disconnect(&path, action)
            .await
            .map_err(store_failed(operation::ABANDON_ON_DISCONNECT, &path))?;
        debug!(game_id, "abandon on disconnect armed");
        Ok(())
    }

    /// Disarms [`abandon_on_disconnect`](Self::abandon_on_disconnect).
    /// Does nothing if the hook already fired or was never armed.
    ///
    /// # Errors
    ///
    /// Store failures, or an invalid game id.
    pub async fn cancel_abandon_on_disconnect(&self, game_id: &str) -> Result<(), GatewayError> {
        let path = self.game_path(game_id)?.child(STATUS)?;
        self.store
            .cancel_on_disconnect(&path)
            .await
            .map_err(store_failed(operation::CANCEL_ABANDON_ON_DISCONNECT, &path))?;
        debug!(game_id, "abandon on disconnect cancelled");
        Ok(())
    }

    /// Arms removal of `players/{playerId}` for when this client disconnects.
    ///
    /// # Errors
    ///
    /// Store failures, or an invalid player id.
    pub async fn delete_on_disconnect(&self, player_id: &str) -> Result<(), GatewayError> {
        let path = self.player_path(player_id)?;
        self.store
            .arm_on_disconnect(&path, DisconnectAction::Remove)
            .await
            .map_err(store_failed(operation::DELETE_ON_DISCONNECT, &path))?;
        debug!(player_id, "delete on disconnect armed");
        Ok(())
    }

    /// Reads a game, with its id restored.
    ///
    /// # Errors
    ///
    /// Store failures, or a stored document that is not a game.
    pub async fn game(&self, game_id: &str) -> Result<Option<Game>, GatewayError> {
        let path = self.game_path(game_id)?;
        self.read(&path, game_id).await
    }

    /// Reads a player, with its id restored.
    ///
    /// # Errors
    ///
    /// Store failures, or a stored document that is not a player.
    pub async fn player(&self, player_id: &str) -> Result<Option<Player>, GatewayError> {
        let path = self.player_path(player_id)?;
        self.read(&path, player_id).await
    }

    async fn read<T: serde::de::DeserializeOwned>(
        &self,
        path: &StorePath,
        key: &str,
    ) -> Result<Option<T>, GatewayError> {
        let document = self
            .store
            .get(path)
            .await
            .map_err(store_failed(operation::READ, path))?;
        Ok(document.map(|doc| from_document(key, doc)).transpose()?)
    }

    async fn append_player(
        &self,
        operation: &'static str,
        request: &GameRequest,
        list: &str,
    ) -> Result<String, GatewayError> {
        let path = self.game_path(&request.game_id)?.child(list)?;
        // The reference keeps the player's id: it points at `players/{id}`.
        let reference = serde_json::to_value(&request.player)?;
        let request_id = self
            .store
            .push(&path, reference)
            .await
            .map_err(store_failed(operation, &path))?;
        debug!(operation, game_id = %request.game_id, request_id = %request_id, "player appended");
        Ok(request_id)
    }

    fn game_path(&self, game_id: &str) -> Result<StorePath, PathError> {
        StorePath::parse(&self.collections.games)?.child(game_id)
    }

    fn player_path(&self, player_id: &str) -> Result<StorePath, PathError> {
        StorePath::parse(&self.collections.players)?.child(player_id)
    }
}

fn store_failed<'a>(
    operation: &'static str,
    path: &'a StorePath,
) -> impl FnOnce(StoreError) -> GatewayError + 'a {
    move |source| {
        warn!(operation, path = %path, error = %source, "store operation failed");
        GatewayError::StoreOperationFailed { operation, source }
    }
}
