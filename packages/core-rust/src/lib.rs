//! Lobby core: game, player and chat records, store paths, push ids, and
//! the message schemas exchanged with the lobby UI.

pub mod feed;
pub mod messages;
pub mod path;
pub mod push_id;
pub mod types;

pub use feed::{ChangeEvent, ChangeKind, FeedQuery, FieldFilter};
pub use messages::{Command, CommandFailure, RequestAck, UiEvent};
pub use path::{PathError, StorePath};
pub use push_id::{PushIdGenerator, PUSH_ID_LEN};
pub use types::{status, ChatMessage, Game, GameRequest, Player};
