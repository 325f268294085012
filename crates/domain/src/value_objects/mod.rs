//! Value objects - validated, immutable building blocks of the domain

mod actor;
mod names;

pub use actor::Actor;
pub use names::{NodeDescription, NodeName};
