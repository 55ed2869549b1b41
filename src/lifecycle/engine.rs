use std::sync::Arc;

use mockable::Clock;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::clients::{ProductClient, RentalClient};
use crate::directory::UserDirectory;
use crate::domain::{
    CreateRental, CurrentUser, ProductStatus, Rental, RentalFinancials, RentalId, Role,
    DEFAULT_DAILY_FINE,
};
use crate::store_actor::Transaction;
use crate::SharedClock;

use super::guards::{require_any_role, ADMIN_ONLY, VENDOR_OR_ADMIN};
use super::validation::validate_create;
use super::{AvailabilityEffect, RentalAction, RentalError};

/// Tunables applied to every new rental.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalPolicy {
    pub daily_fine: Decimal,
    pub max_days: u32,
}

impl Default for RentalPolicy {
    fn default() -> Self {
        Self {
            daily_fine: DEFAULT_DAILY_FINE,
            max_days: 60,
        }
    }
}

/// Drives rentals through their lifecycle and keeps the product's
/// availability flag in step.
///
/// Every transition reads the rental, applies a [`RentalAction`], and commits
/// the rental write together with any product-status write as one
/// [`Transaction`]. A concurrent writer surfaces as [`RentalError::Conflict`];
/// the engine itself never retries.
#[derive(Clone)]
pub struct RentalLifecycleEngine {
    rentals: RentalClient,
    products: ProductClient,
    directory: Arc<dyn UserDirectory>,
    clock: SharedClock,
    policy: RentalPolicy,
}

impl RentalLifecycleEngine {
    pub fn new(
        rentals: RentalClient,
        products: ProductClient,
        directory: Arc<dyn UserDirectory>,
        clock: SharedClock,
        policy: RentalPolicy,
    ) -> Self {
        Self {
            rentals,
            products,
            directory,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> RentalPolicy {
        self.policy
    }

    #[instrument(
        fields(renter_id = %caller.id, product_id = %request.product_id, days = request.days),
        skip(self, caller, request)
    )]
    pub async fn create_rental(
        &self,
        caller: &CurrentUser,
        request: CreateRental,
    ) -> Result<Rental, RentalError> {
        validate_create(&request, self.policy.max_days)?;

        let product = self.products.require_product(request.product_id).await?;
        if !product.is_available() {
            warn!(status = %product.status, "Product is not available");
            return Err(RentalError::invalid_state(
                "product",
                product.id,
                format!("must be AVAILABLE to rent (status is {})", product.status),
            ));
        }

        let id = RentalId::random();
        let rental = Rental::open(
            id,
            caller.id,
            request,
            &product,
            self.policy.daily_fine,
            self.clock.utc(),
        )?;
        let tx = Transaction::new()
            .insert_rental(rental)
            .claim_product(product.id);

        let committed = self.rentals.commit(tx).await?;
        let stored = committed
            .rental(&id)
            .cloned()
            .ok_or_else(|| RentalError::NotFound {
                entity: "rental",
                id: id.to_string(),
            })?;

        info!(
            rental_id = %id,
            total = %stored.total_amount,
            end_date = %stored.end_date,
            "Rental created"
        );
        Ok(stored)
    }

    #[instrument(fields(rental_id = %id, caller_id = %caller.id), skip(self, caller))]
    pub async fn confirm_rental(
        &self,
        caller: &CurrentUser,
        id: RentalId,
    ) -> Result<Rental, RentalError> {
        self.require_roles(caller, VENDOR_OR_ADMIN, id, "confirm")?;
        self.transition(id, RentalAction::Confirm).await
    }

    #[instrument(fields(rental_id = %id, caller_id = %caller.id), skip(self, caller))]
    pub async fn handover_rental(
        &self,
        caller: &CurrentUser,
        id: RentalId,
    ) -> Result<Rental, RentalError> {
        self.require_roles(caller, VENDOR_OR_ADMIN, id, "handover")?;
        self.transition(id, RentalAction::Handover).await
    }

    #[instrument(
        fields(rental_id = %id, caller_id = %caller.id),
        skip(self, caller, note, image_url)
    )]
    pub async fn request_return(
        &self,
        caller: &CurrentUser,
        id: RentalId,
        note: Option<String>,
        image_url: Option<String>,
    ) -> Result<Rental, RentalError> {
        self.transition(id, RentalAction::RequestReturn { note, image_url })
            .await
    }

    #[instrument(fields(rental_id = %id, caller_id = %caller.id), skip(self, caller))]
    pub async fn approve_return(
        &self,
        caller: &CurrentUser,
        id: RentalId,
    ) -> Result<Rental, RentalError> {
        self.require_roles(caller, VENDOR_OR_ADMIN, id, "approve return")?;
        self.transition(id, RentalAction::ApproveReturn).await
    }

    #[instrument(fields(rental_id = %id, caller_id = %caller.id), skip(self, caller, reason, note))]
    pub async fn reject_return(
        &self,
        caller: &CurrentUser,
        id: RentalId,
        reason: String,
        note: Option<String>,
    ) -> Result<Rental, RentalError> {
        self.require_roles(caller, VENDOR_OR_ADMIN, id, "reject return")?;
        self.transition(id, RentalAction::RejectReturn { reason, note })
            .await
    }

    #[instrument(fields(rental_id = %id, caller_id = %caller.id), skip(self, caller))]
    pub async fn cancel_rental(
        &self,
        caller: &CurrentUser,
        id: RentalId,
    ) -> Result<Rental, RentalError> {
        self.transition(id, RentalAction::Cancel).await
    }

    /// ACTIVE rentals past their end date and not yet returned, as of the
    /// clock's current UTC date.
    #[instrument(fields(caller_id = %caller.id), skip(self, caller))]
    pub async fn list_overdue(&self, caller: &CurrentUser) -> Result<Vec<Rental>, RentalError> {
        require_any_role(
            self.directory.as_ref(),
            caller,
            ADMIN_ONLY,
            "rental",
            "*",
            "list overdue",
        )?;
        let today = self.clock.utc().date_naive();
        let overdue = self.rentals.list_overdue(today).await?;
        info!(count = overdue.len(), %today, "Overdue rentals listed");
        Ok(overdue)
    }

    pub async fn get_rental(&self, id: RentalId) -> Result<Rental, RentalError> {
        self.rentals.require_rental(id).await
    }

    #[instrument(fields(renter_id = %caller.id), skip(self, caller))]
    pub async fn list_for_renter(&self, caller: &CurrentUser) -> Result<Vec<Rental>, RentalError> {
        self.rentals.list_by_renter(caller.id).await
    }

    #[instrument(fields(vendor_id = %caller.id), skip(self, caller))]
    pub async fn list_for_vendor(&self, caller: &CurrentUser) -> Result<Vec<Rental>, RentalError> {
        require_any_role(
            self.directory.as_ref(),
            caller,
            VENDOR_OR_ADMIN,
            "rental",
            "*",
            "list vendor rentals",
        )?;
        self.rentals.list_by_vendor(caller.id).await
    }

    /// Overdue days and fines as of now. Nothing is written.
    #[instrument(fields(rental_id = %id), skip(self))]
    pub async fn financials(&self, id: RentalId) -> Result<RentalFinancials, RentalError> {
        let rental = self.rentals.require_rental(id).await?;
        rental.financials(self.clock.utc()).ok_or_else(|| {
            RentalError::validation(
                format!("rental {id}"),
                "daily_fine",
                "fine exceeds supported range",
            )
        })
    }

    fn require_roles(
        &self,
        caller: &CurrentUser,
        roles: &[Role],
        id: RentalId,
        operation: &str,
    ) -> Result<(), RentalError> {
        require_any_role(self.directory.as_ref(), caller, roles, "rental", id, operation)
    }

    /// Load, apply, commit. The rental write carries the version it was read
    /// at, so a concurrent transition on the same rental fails the commit.
    async fn transition(&self, id: RentalId, action: RentalAction) -> Result<Rental, RentalError> {
        let action_name = action.name();
        let mut rental = self.rentals.require_rental(id).await?;
        let from = rental.status;

        let effect = rental.apply(action, self.clock.utc()).inspect_err(|e| {
            warn!(action = action_name, status = %from, error = %e, "Transition refused");
        })?;

        let product_id = rental.product_id;
        let mut tx = Transaction::new().update_rental(rental);
        if effect == AvailabilityEffect::Release {
            tx = tx.set_product_status(product_id, ProductStatus::Available);
        }
        debug!(action = action_name, ?effect, "Committing transition");

        let committed = self.rentals.commit(tx).await.inspect_err(|e| {
            warn!(action = action_name, error = %e, "Commit failed");
        })?;
        let stored = committed
            .rental(&id)
            .cloned()
            .ok_or_else(|| RentalError::NotFound {
                entity: "rental",
                id: id.to_string(),
            })?;

        info!(
            action = action_name,
            from = %from,
            to = %stored.status,
            return_status = %stored.return_request.status,
            "Rental transitioned"
        );
        Ok(stored)
    }
}
