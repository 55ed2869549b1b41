//! Rental state machine and the engine that commits its transitions.

mod actions;
mod engine;
pub mod error;
pub mod guards;
pub mod validation;

pub use actions::*;
pub use engine::*;
pub use error::*;
