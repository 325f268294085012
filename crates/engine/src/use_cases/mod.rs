//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.

pub mod audit;
pub mod game_nodes;

pub use audit::{AuditGames, AuditReport};
pub use game_nodes::{ErrorKind, GameNodeError, GameNodeOps};
