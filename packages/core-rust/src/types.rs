use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known game status values.
///
/// Status is carried as an opaque string; these are the values the lobby
/// UI and the disconnect hook write. Nothing here validates transitions.
pub mod status {
    pub const OPEN: &str = "Open";
    pub const RUNNING: &str = "Running";
    pub const ABANDONED: &str = "Abandoned";
    pub const FINISHED: &str = "Finished";
}

/// Field name under which a record's store key is exposed to the UI.
pub const ID_FIELD: &str = "id";

/// A game record in the `games` collection.
///
/// Unknown fields (board state, scores, ...) are kept in `extra` and
/// written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Store-assigned key. Absent until the game has been opened.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,

    #[serde(default)]
    pub status: String,

    /// Players asking to take the free seat, keyed by push id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub join_requests: BTreeMap<String, Player>,

    /// Players watching, keyed by push id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub spectators: BTreeMap<String, Player>,

    /// Outcome, only present once the game is finished.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Game {
    /// A fresh game in the given status, without id.
    #[must_use]
    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..Self::default()
        }
    }
}

/// A player record in the `players` collection; also used as the player
/// reference inside join requests and spectator lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Player {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A chat message. The body is opaque.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,

    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// A player reference addressed to one game: join or watch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    pub game_id: String,
    pub player: Player,
}

/// Serializes a record for storage, dropping its `id` field.
///
/// Keys live in the path, never in the stored document.
///
/// # Errors
///
/// Returns the serializer error if `record` cannot be represented as JSON.
pub fn to_document<T: Serialize>(record: &T) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.remove(ID_FIELD);
    }
    Ok(value)
}

/// Merges a store key into a payload as its `id` field.
///
/// The store delivers key and payload separately; everything forwarded
/// to the UI carries both. Non-object payloads are wrapped as
/// `{"id": key, "value": payload}`.
#[must_use]
pub fn with_id(key: &str, payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.insert(ID_FIELD.to_string(), Value::String(key.to_string()));
            Value::Object(map)
        }
        other => {
            let mut map = Map::new();
            map.insert(ID_FIELD.to_string(), Value::String(key.to_string()));
            map.insert("value".to_string(), other);
            Value::Object(map)
        }
    }
}

/// Deserializes a stored document into a record, restoring its id.
///
/// # Errors
///
/// Returns the deserializer error if the document does not fit `T`.
pub fn from_document<T: DeserializeOwned>(key: &str, document: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(with_id(key, document))
}
