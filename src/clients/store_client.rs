use tokio::sync::mpsc;

use crate::domain::{Product, ProductId, ProductQuery, Rental, RentalId, RentalQuery};
use crate::store_actor::{Committed, StoreRequest, Transaction};

/// Raw handle to the store actor. Cheap to clone; the actor stops once every
/// clone is dropped.
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }
}

client_method!(StoreClient => fn get_product(id: ProductId) -> Option<Product> as StoreRequest::GetProduct);
client_method!(StoreClient => fn get_rental(id: RentalId) -> Option<Rental> as StoreRequest::GetRental);
client_method!(StoreClient => fn query_products(query: ProductQuery) -> Vec<Product> as StoreRequest::QueryProducts);
client_method!(StoreClient => fn query_rentals(query: RentalQuery) -> Vec<Rental> as StoreRequest::QueryRentals);
client_method!(StoreClient => fn commit(tx: Transaction) -> Committed as StoreRequest::Commit);

// Test-only peek at actor state.
#[cfg(test)]
client_method!(StoreClient => fn get_row_counts() -> (usize, usize) as StoreRequest::GetRowCounts);
