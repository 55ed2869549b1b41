use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::domain::{Rental, RentalId, RentalQuery, UserId};
use crate::lifecycle::RentalError;
use crate::store_actor::{Committed, Transaction};

use super::StoreClient;

/// Persistence access for rental records.
#[derive(Clone)]
pub struct RentalClient {
    store: StoreClient,
}

impl_lookup_methods!(RentalClient, Rental, RentalId, RentalError, rental);

impl RentalClient {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: RentalQuery) -> Result<Vec<Rental>, RentalError> {
        debug!("Sending request");
        Ok(self.store.query_rentals(query).await?)
    }

    pub async fn list_by_renter(&self, renter_id: UserId) -> Result<Vec<Rental>, RentalError> {
        self.list(RentalQuery::ByRenter(renter_id)).await
    }

    /// Rentals of every product the vendor owns, newest first.
    pub async fn list_by_vendor(&self, vendor_id: UserId) -> Result<Vec<Rental>, RentalError> {
        self.list(RentalQuery::ByVendor(vendor_id)).await
    }

    pub async fn list_overdue(&self, today: NaiveDate) -> Result<Vec<Rental>, RentalError> {
        self.list(RentalQuery::Overdue { today }).await
    }

    /// Commits a unit of work that may also touch products.
    #[instrument(skip(self, tx), fields(operations = tx.operations().len()))]
    pub async fn commit(&self, tx: Transaction) -> Result<Committed, RentalError> {
        debug!("Sending request");
        Ok(self.store.commit(tx).await?)
    }
}
