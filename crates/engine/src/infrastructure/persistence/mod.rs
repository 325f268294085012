//! Game store adapters
//!
//! Both implement [`GameRepo`](crate::infrastructure::ports::GameRepo) and
//! store each game as one unit.

mod json_file;
mod memory;

pub use json_file::JsonFileGameRepo;
pub use memory::InMemoryGameRepo;
