//! Business records shared by the store actor, the clients and the engine.

pub mod financials;
pub mod ids;
pub mod product;
pub mod rental;
pub mod user;

pub use financials::*;
pub use ids::*;
pub use product::*;
pub use rental::*;
pub use user::*;
