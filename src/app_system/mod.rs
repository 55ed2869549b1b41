//! System orchestration, startup, and shutdown logic.

pub mod error;
pub mod rental_system;
pub mod sweep;
pub mod telemetry;

pub use error::*;
pub use rental_system::*;
pub use sweep::*;
pub use telemetry::*;
