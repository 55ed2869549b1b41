//! Cloneable handles over the store actor.
//!
//! `StoreClient` speaks the raw request protocol; `ProductClient` and
//! `RentalClient` add the domain rules for their records on top of it.

#[macro_use]
mod macros;

mod product_client;
mod rental_client;
mod store_client;

pub use product_client::*;
pub use rental_client::*;
pub use store_client::*;
