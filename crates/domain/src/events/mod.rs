//! Domain Events
//!
//! Return types from aggregate mutations, communicating what happened when
//! state was modified. Callers use them for logging and change feeds; they
//! are never persisted by the domain.

pub mod node_events;

pub use node_events::*;
