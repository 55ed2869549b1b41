use crate::actor_framework::Response;
use crate::domain::{Product, ProductId, ProductQuery, Rental, RentalId, RentalQuery};

use super::{Committed, Transaction};

/// Typed messages for the store actor. Each variant carries its parameters
/// and a oneshot channel for the reply.
#[derive(Debug)]
pub enum StoreRequest {
    GetProduct {
        id: ProductId,
        respond_to: Response<Option<Product>>,
    },
    GetRental {
        id: RentalId,
        respond_to: Response<Option<Rental>>,
    },
    QueryProducts {
        query: ProductQuery,
        respond_to: Response<Vec<Product>>,
    },
    QueryRentals {
        query: RentalQuery,
        respond_to: Response<Vec<Rental>>,
    },
    Commit {
        tx: Transaction,
        respond_to: Response<Committed>,
    },
    #[cfg(test)]
    GetRowCounts {
        respond_to: Response<(usize, usize)>,
    },
}
