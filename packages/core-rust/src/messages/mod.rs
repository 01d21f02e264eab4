//! Message schemas crossing the UI boundary.
//!
//! Both directions use adjacently tagged JSON (`{"type", "payload"}`) with
//! camelCase names so the UI's port names map one-to-one onto variants.

pub mod commands;
pub mod events;

pub use commands::Command;
pub use events::{CommandFailure, RequestAck, UiEvent};
