use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{check_version, not_found, Entity, Response, Table};
use crate::clients::StoreClient;
use crate::domain::{Product, ProductId, ProductQuery, Rental, RentalId, RentalQuery};

use super::{Committed, Operation, StoreError, StoreRequest, Transaction};

/// Single writer for every product and rental record.
///
/// Requests are handled one at a time, so a commit is validated and applied
/// without any other request observing a half-written state.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    products: Table<Product>,
    rentals: Table<Rental>,
}

/// Writes accumulated while validating a transaction. `None` marks a deletion.
#[derive(Default)]
struct Staged {
    products: HashMap<ProductId, Option<Product>>,
    rentals: HashMap<RentalId, Rental>,
}

impl Staged {
    fn product(&self, table: &Table<Product>, id: &ProductId) -> Option<Product> {
        match self.products.get(id) {
            Some(staged) => staged.clone(),
            None => table.get(id).cloned(),
        }
    }

    fn rental(&self, table: &Table<Rental>, id: &RentalId) -> Option<Rental> {
        self.rentals.get(id).or_else(|| table.get(id)).cloned()
    }

    fn rental_holding(&self, table: &Table<Rental>, product_id: &ProductId) -> Option<RentalId> {
        let stored = table.values().filter(|r| !self.rentals.contains_key(&r.id));
        self.rentals
            .values()
            .chain(stored)
            .find(|r| &r.product_id == product_id && r.holds_product())
            .map(|r| r.id)
    }
}

impl StoreActor {
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            products: Table::default(),
            rentals: Table::default(),
        };
        (actor, StoreClient::new(sender))
    }

    /// Main actor loop. Ends once every client handle has been dropped.
    #[instrument(name = "store_actor", skip(self))]
    pub async fn run(mut self) {
        info!("StoreActor starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::GetProduct { id, respond_to } => {
                    self.handle_get_product(id, respond_to)
                }
                StoreRequest::GetRental { id, respond_to } => {
                    self.handle_get_rental(id, respond_to)
                }
                StoreRequest::QueryProducts { query, respond_to } => {
                    self.handle_query_products(query, respond_to)
                }
                StoreRequest::QueryRentals { query, respond_to } => {
                    self.handle_query_rentals(query, respond_to)
                }
                StoreRequest::Commit { tx, respond_to } => self.handle_commit(tx, respond_to),
                #[cfg(test)]
                StoreRequest::GetRowCounts { respond_to } => {
                    let _ = respond_to.send(Ok((self.products.len(), self.rentals.len())));
                }
            }
        }

        info!("StoreActor stopped");
    }

    #[instrument(fields(product_id = %id), skip(self, respond_to))]
    fn handle_get_product(&self, id: ProductId, respond_to: Response<Option<Product>>) {
        debug!("Processing get_product request");
        let product = self.products.get(&id).cloned();
        if product.is_none() {
            debug!("Product not found");
        }
        let _ = respond_to.send(Ok(product));
    }

    #[instrument(fields(rental_id = %id), skip(self, respond_to))]
    fn handle_get_rental(&self, id: RentalId, respond_to: Response<Option<Rental>>) {
        debug!("Processing get_rental request");
        let rental = self.rentals.get(&id).cloned();
        if rental.is_none() {
            debug!("Rental not found");
        }
        let _ = respond_to.send(Ok(rental));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_query_products(&self, query: ProductQuery, respond_to: Response<Vec<Product>>) {
        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(count = products.len(), "Listed products");
        let _ = respond_to.send(Ok(products));
    }

    /// Newest first, matching the vendor dashboard ordering.
    #[instrument(skip(self, respond_to))]
    fn handle_query_rentals(&self, query: RentalQuery, respond_to: Response<Vec<Rental>>) {
        let mut rentals: Vec<Rental> = self
            .rentals
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        rentals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(count = rentals.len(), "Listed rentals");
        let _ = respond_to.send(Ok(rentals));
    }

    #[instrument(fields(operations = tx.operations().len()), skip(self, tx, respond_to))]
    fn handle_commit(&mut self, tx: Transaction, respond_to: Response<Committed>) {
        debug!("Processing commit request");

        let result = self.stage(tx).map(|staged| self.apply(staged));
        match &result {
            Ok(committed) => info!(
                rentals = committed.rentals.len(),
                products = committed.products.len(),
                "Transaction committed"
            ),
            Err(e) => warn!(error = %e, "Transaction rejected"),
        }

        let _ = respond_to.send(result);
    }

    /// Validates every operation against the current tables plus earlier
    /// operations of the same transaction. Nothing is written here.
    fn stage(&self, tx: Transaction) -> Result<Staged, StoreError> {
        let mut staged = Staged::default();

        for operation in tx.into_operations() {
            match operation {
                Operation::InsertProduct(mut product) => {
                    let id = product.id;
                    if self.products.contains(&id) || staged.products.contains_key(&id) {
                        return Err(already_exists::<Product>(&id));
                    }
                    product.set_version(1);
                    staged.products.insert(id, Some(product));
                }
                Operation::UpdateProduct {
                    mut product,
                    expected_version,
                } => {
                    let id = product.id;
                    let current = staged
                        .product(&self.products, &id)
                        .ok_or_else(|| not_found::<Product>(&id))?;
                    check_version(&current, expected_version)?;
                    // Status only moves through SetProductStatus.
                    product.status = current.status;
                    product.set_version(expected_version + 1);
                    staged.products.insert(id, Some(product));
                }
                Operation::DeleteProduct { id, expected_version } => {
                    let current = staged
                        .product(&self.products, &id)
                        .ok_or_else(|| not_found::<Product>(&id))?;
                    check_version(&current, expected_version)?;
                    if let Some(rental_id) = staged.rental_holding(&self.rentals, &id) {
                        return Err(StoreError::StillReferenced {
                            id: id.to_string(),
                            rental_id: rental_id.to_string(),
                        });
                    }
                    staged.products.insert(id, None);
                }
                Operation::SetProductStatus { id, status, expected } => {
                    let mut current = staged
                        .product(&self.products, &id)
                        .ok_or_else(|| not_found::<Product>(&id))?;
                    if let Some(expected) = expected {
                        if current.status != expected {
                            return Err(StoreError::StatusConflict {
                                id: id.to_string(),
                                expected,
                                found: current.status,
                            });
                        }
                    }
                    if current.status != status {
                        current.status = status;
                        current.set_version(current.version() + 1);
                    }
                    staged.products.insert(id, Some(current));
                }
                Operation::InsertRental(mut rental) => {
                    let id = rental.id;
                    if self.rentals.contains(&id) || staged.rentals.contains_key(&id) {
                        return Err(already_exists::<Rental>(&id));
                    }
                    rental.set_version(1);
                    staged.rentals.insert(id, rental);
                }
                Operation::UpdateRental {
                    mut rental,
                    expected_version,
                } => {
                    let id = rental.id;
                    let current = staged
                        .rental(&self.rentals, &id)
                        .ok_or_else(|| not_found::<Rental>(&id))?;
                    check_version(&current, expected_version)?;
                    rental.set_version(expected_version + 1);
                    staged.rentals.insert(id, rental);
                }
            }
        }

        Ok(staged)
    }

    fn apply(&mut self, staged: Staged) -> Committed {
        let mut committed = Committed::default();

        for (id, product) in staged.products {
            match product {
                Some(product) => {
                    self.products.put(product.clone());
                    committed.products.push(product);
                }
                None => {
                    self.products.remove(&id);
                    committed.deleted_products.push(id);
                }
            }
        }
        for rental in staged.rentals.into_values() {
            self.rentals.put(rental.clone());
            committed.rentals.push(rental);
        }

        committed
    }
}

fn already_exists<T: Entity>(id: &T::Id) -> StoreError {
    StoreError::AlreadyExists {
        kind: T::KIND,
        id: id.to_string(),
    }
}
