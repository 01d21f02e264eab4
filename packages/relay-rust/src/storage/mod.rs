//! Document storage for the relay.
//!
//! [`MemoryStore`] is the in-process implementation of
//! [`DocumentStore`](crate::traits::DocumentStore). It is layered as:
//!
//! - **Tree** ([`tree`]): path-addressed reads and writes over a JSON tree
//! - **Rules** ([`WriteRules`]): per-collection write permissions
//! - **Observers** ([`MutationObserver`]): fan-out of committed writes, of
//!   which [`FeedRegistry`] turns them into per-child change events
//! - **Hooks** ([`DisconnectHooks`]): writes deferred until the client
//!   connection is lost

pub mod disconnect;
pub mod error;
pub mod feed;
pub mod memory;
pub mod mutation_observer;
pub mod rules;
pub mod tree;

pub use disconnect::*;
pub use error::*;
pub use feed::*;
pub use memory::*;
pub use mutation_observer::*;
pub use rules::*;
