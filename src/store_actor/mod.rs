//! The single-writer store: product and rental tables behind one actor, and
//! the unit of work used to change them together.

mod actor;
pub mod error;
mod messages;
mod transaction;

pub use actor::*;
pub use error::*;
pub use messages::*;
pub use transaction::*;
