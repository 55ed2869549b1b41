use std::sync::Arc;

use mockable::Clock;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::directory::UserDirectory;
use crate::domain::{
    CurrentUser, Location, Product, ProductCreate, ProductId, ProductPatch, ProductQuery,
    ProductStatus, Role, UserId,
};
use crate::store_actor::{StoreError, Transaction};
use crate::SharedClock;

use super::StoreClient;

/// Errors that can occur during product operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("user {caller} may not modify product {id}: {rule}")]
    Forbidden {
        caller: UserId,
        id: String,
        rule: &'static str,
    },
    #[error("{subject}: invalid {field}: {rule}")]
    Validation {
        subject: String,
        field: &'static str,
        rule: String,
    },
    #[error("product {id}: {rule}")]
    InvalidState { id: String, rule: String },
    #[error("product {id} changed concurrently ({detail}); retry the operation")]
    Conflict { id: String, detail: String },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for ProductError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => ProductError::NotFound(id),
            StoreError::StillReferenced { id, rental_id } => ProductError::InvalidState {
                id,
                rule: format!("cannot be deleted while rental {rental_id} holds it"),
            },
            StoreError::AlreadyExists { id, .. } => ProductError::Conflict {
                id,
                detail: "record already exists".to_string(),
            },
            StoreError::VersionConflict {
                id, expected, found, ..
            } => ProductError::Conflict {
                id,
                detail: format!("read version {expected}, stored version {found}"),
            },
            StoreError::StatusConflict { id, expected, found } => ProductError::Conflict {
                id,
                detail: format!("expected status {expected}, found {found}"),
            },
            StoreError::ActorCommunicationError(msg) => ProductError::ActorCommunicationError(msg),
        }
    }
}

/// Product listings and their availability flag.
#[derive(Clone)]
pub struct ProductClient {
    store: StoreClient,
    directory: Arc<dyn UserDirectory>,
    clock: SharedClock,
}

impl_lookup_methods!(ProductClient, Product, ProductId, ProductError, product);

impl ProductClient {
    pub fn new(store: StoreClient, directory: Arc<dyn UserDirectory>, clock: SharedClock) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    #[instrument(
        fields(vendor_id = %caller.id, product_name = %params.name),
        skip(self, caller, params)
    )]
    pub async fn create_product(
        &self,
        caller: &CurrentUser,
        params: ProductCreate,
    ) -> Result<Product, ProductError> {
        if !self.directory.has_any_role(caller, &[Role::Vendor, Role::SuperAdmin]) {
            warn!(role = %caller.role, "Only vendors list products");
            return Err(ProductError::Forbidden {
                caller: caller.id,
                id: "new".to_string(),
                rule: "only vendors or admins can list products",
            });
        }
        validate_listing(&params.name, &params.category, params.price_per_day, &params.location)
            .map_err(|(field, rule)| ProductError::Validation {
                subject: format!("new product {}", params.name.trim()),
                field,
                rule,
            })?;

        let id = ProductId::random();
        let product = Product::list(id, caller.id, params, self.clock.utc());
        let committed = self.store.commit(Transaction::new().insert_product(product)).await?;
        let stored = committed
            .product(&id)
            .cloned()
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        info!(product_id = %id, "Product listed");
        Ok(stored)
    }

    #[instrument(fields(product_id = %id, caller_id = %caller.id), skip(self, caller, patch))]
    pub async fn update_product(
        &self,
        caller: &CurrentUser,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ProductError> {
        let mut product = self.require_product(id).await?;
        self.ensure_owner(caller, &product, "only the owning vendor can edit this product")?;

        let name = patch.name.as_deref().unwrap_or(&product.name);
        let category = patch.category.as_deref().unwrap_or(&product.category);
        let price = patch.price_per_day.unwrap_or(product.price_per_day);
        let location = patch.location.as_ref().unwrap_or(&product.location);
        validate_listing(name, category, price, location).map_err(|(field, rule)| {
            ProductError::Validation {
                subject: format!("product {id}"),
                field,
                rule,
            }
        })?;

        product.apply_patch(patch, self.clock.utc());
        let committed = self.store.commit(Transaction::new().update_product(product)).await?;
        let stored = committed
            .product(&id)
            .cloned()
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        info!(version = stored.version, "Product updated");
        Ok(stored)
    }

    #[instrument(fields(product_id = %id, caller_id = %caller.id), skip(self, caller))]
    pub async fn delete_product(
        &self,
        caller: &CurrentUser,
        id: ProductId,
    ) -> Result<(), ProductError> {
        let product = self.require_product(id).await?;
        self.ensure_owner(caller, &product, "only the owning vendor can delete this product")?;

        self.store
            .commit(Transaction::new().delete_product(id, product.version))
            .await?;
        info!("Product deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>, ProductError> {
        debug!("Sending request");
        Ok(self.store.query_products(query).await?)
    }

    /// Idempotent overwrite of the availability flag, outside any rental
    /// transition. Transitions stage the same write inside their own commit.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: ProductId,
        status: ProductStatus,
    ) -> Result<Product, ProductError> {
        let committed = self
            .store
            .commit(Transaction::new().set_product_status(id, status))
            .await?;
        committed
            .product(&id)
            .cloned()
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    fn ensure_owner(
        &self,
        caller: &CurrentUser,
        product: &Product,
        rule: &'static str,
    ) -> Result<(), ProductError> {
        if product.vendor_id == caller.id
            || self.directory.has_any_role(caller, &[Role::SuperAdmin])
        {
            return Ok(());
        }
        warn!(owner_id = %product.vendor_id, "Ownership check failed");
        Err(ProductError::Forbidden {
            caller: caller.id,
            id: product.id.to_string(),
            rule,
        })
    }
}

fn validate_listing(
    name: &str,
    category: &str,
    price_per_day: Decimal,
    location: &Location,
) -> Result<(), (&'static str, String)> {
    if name.trim().is_empty() {
        return Err(("name", "must not be blank".to_string()));
    }
    if category.trim().is_empty() {
        return Err(("category", "must not be blank".to_string()));
    }
    if price_per_day <= Decimal::ZERO {
        return Err(("price_per_day", format!("must be greater than 0, got {price_per_day}")));
    }
    if let Some(lat) = location.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(("latitude", format!("must be within [-90, 90], got {lat}")));
        }
    }
    if let Some(lng) = location.longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(("longitude", format!("must be within [-180, 180], got {lng}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_support::{product_params, TestHarness};

    #[tokio::test]
    async fn vendor_lists_available_product() {
        let harness = TestHarness::start().await;
        let product = harness
            .products
            .create_product(&harness.vendor, product_params("10.00"))
            .await
            .unwrap();

        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(product.vendor_id, harness.vendor.id);
        assert_eq!(product.version, 1);
    }

    #[tokio::test]
    async fn customers_cannot_list_products() {
        let harness = TestHarness::start().await;
        let err = harness
            .products
            .create_product(&harness.customer, product_params("10.00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Forbidden { .. }));
    }

    #[rstest]
    #[case("0")]
    #[case("-5.00")]
    #[tokio::test]
    async fn non_positive_price_is_rejected(#[case] price: &str) {
        let harness = TestHarness::start().await;
        let err = harness
            .products
            .create_product(&harness.vendor, product_params(price))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProductError::Validation { field: "price_per_day", .. }
        ));
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_edit() {
        let harness = TestHarness::start().await;
        let product = harness.listed_product("10.00").await;
        let patch = ProductPatch {
            name: Some("Renamed".to_string()),
            ..ProductPatch::default()
        };

        let other_vendor = harness.register_vendor("other@example.com").await;
        let err = harness
            .products
            .update_product(&other_vendor, product.id, patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Forbidden { .. }));

        let updated = harness
            .products
            .update_product(&harness.admin, product.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn set_status_twice_is_not_an_error() {
        let harness = TestHarness::start().await;
        let product = harness.listed_product("10.00").await;

        for _ in 0..2 {
            let stored = harness
                .products
                .set_status(product.id, ProductStatus::Available)
                .await
                .unwrap();
            assert_eq!(stored.status, ProductStatus::Available);
        }
    }

    #[tokio::test]
    async fn set_status_on_unknown_product_is_not_found() {
        let harness = TestHarness::start().await;
        let id = ProductId::random();
        let err = harness
            .products
            .set_status(id, ProductStatus::Rented)
            .await
            .unwrap_err();
        assert_eq!(err, ProductError::NotFound(id.to_string()));
    }
}
