use crate::actor_framework::Entity;
use crate::domain::{Product, ProductId, ProductStatus, Rental, RentalId};

/// One staged write. Writes that replace a record carry the version they were
/// computed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    InsertProduct(Product),
    UpdateProduct { product: Product, expected_version: u64 },
    DeleteProduct { id: ProductId, expected_version: u64 },
    /// Overwrites the availability flag. With `expected` set the write only
    /// succeeds from that prior status; without it the write is idempotent.
    SetProductStatus {
        id: ProductId,
        status: ProductStatus,
        expected: Option<ProductStatus>,
    },
    InsertRental(Rental),
    UpdateRental { rental: Rental, expected_version: u64 },
}

/// A unit of work the store actor applies all-or-nothing.
///
/// Built up with the consuming helpers, then handed to
/// [`StoreClient::commit`](crate::clients::StoreClient::commit).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn insert_product(self, product: Product) -> Self {
        self.push(Operation::InsertProduct(product))
    }

    /// Replaces `product`, expecting the store to still hold `product.version`.
    pub fn update_product(self, product: Product) -> Self {
        let expected_version = product.version();
        self.push(Operation::UpdateProduct {
            product,
            expected_version,
        })
    }

    pub fn delete_product(self, id: ProductId, expected_version: u64) -> Self {
        self.push(Operation::DeleteProduct { id, expected_version })
    }

    pub fn set_product_status(self, id: ProductId, status: ProductStatus) -> Self {
        self.push(Operation::SetProductStatus {
            id,
            status,
            expected: None,
        })
    }

    /// AVAILABLE -> RENTED, failing if someone else got there first.
    pub fn claim_product(self, id: ProductId) -> Self {
        self.push(Operation::SetProductStatus {
            id,
            status: ProductStatus::Rented,
            expected: Some(ProductStatus::Available),
        })
    }

    pub fn insert_rental(self, rental: Rental) -> Self {
        self.push(Operation::InsertRental(rental))
    }

    /// Replaces `rental`, expecting the store to still hold `rental.version`.
    pub fn update_rental(self, rental: Rental) -> Self {
        let expected_version = rental.version();
        self.push(Operation::UpdateRental {
            rental,
            expected_version,
        })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub(crate) fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

/// Records as they stand after a successful commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Committed {
    pub products: Vec<Product>,
    pub deleted_products: Vec<ProductId>,
    pub rentals: Vec<Rental>,
}

impl Committed {
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn rental(&self, id: &RentalId) -> Option<&Rental> {
        self.rentals.iter().find(|r| &r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RentalStatus;
    use crate::test_support::sample_rental;

    #[test]
    fn update_rental_captures_read_version() {
        let mut rental = sample_rental(RentalStatus::Active);
        rental.version = 7;
        let tx = Transaction::new()
            .update_rental(rental.clone())
            .set_product_status(rental.product_id, ProductStatus::Available);

        assert_eq!(tx.operations().len(), 2);
        assert!(matches!(
            &tx.operations()[0],
            Operation::UpdateRental { expected_version: 7, .. }
        ));
        assert!(matches!(
            &tx.operations()[1],
            Operation::SetProductStatus { expected: None, status: ProductStatus::Available, .. }
        ));
    }
}
