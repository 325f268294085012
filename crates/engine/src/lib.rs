//! QuestForge Engine library.
//!
//! Game-editing service built on the `questforge-domain` node tree.
//!
//! ## Structure
//!
//! - `use_cases/` - Load a game, apply one mutation, save it back
//! - `infrastructure/` - Ports plus their adapters (stores, clock, config)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
