//! The rental state machine, as pure functions on [`Rental`].
//!
//! ```text
//! PENDING --confirm--> ACTIVE --approve return--> COMPLETED
//!    |
//!    +--cancel--> CANCELLED
//! ```
//!
//! While ACTIVE the return request moves `NONE -> PENDING -> APPROVED | REJECTED`,
//! and a REJECTED request may be submitted again.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{
    CreateRental, Product, Rental, RentalId, RentalStatus, ReturnRequest, ReturnRequestStatus,
    UserId,
};

use super::RentalError;

#[derive(Debug, Clone, PartialEq)]
pub enum RentalAction {
    Confirm,
    Handover,
    RequestReturn {
        note: Option<String>,
        image_url: Option<String>,
    },
    ApproveReturn,
    RejectReturn {
        reason: String,
        note: Option<String>,
    },
    Cancel,
}

impl RentalAction {
    pub fn name(&self) -> &'static str {
        match self {
            RentalAction::Confirm => "confirm",
            RentalAction::Handover => "handover",
            RentalAction::RequestReturn { .. } => "request return",
            RentalAction::ApproveReturn => "approve return",
            RentalAction::RejectReturn { .. } => "reject return",
            RentalAction::Cancel => "cancel",
        }
    }
}

/// What a transition means for the product's availability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityEffect {
    Keep,
    Release,
}

impl Rental {
    /// Builds a PENDING rental for `product`. Version 0 marks it as not yet
    /// stored.
    pub fn open(
        id: RentalId,
        renter_id: UserId,
        request: CreateRental,
        product: &Product,
        daily_fine: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self, RentalError> {
        let end_date = request
            .start_date
            .checked_add_days(chrono::Days::new(u64::from(request.days)))
            .ok_or_else(|| {
                RentalError::validation(
                    format!("rental request for product {}", product.id),
                    "start_date",
                    "end date falls outside the supported calendar",
                )
            })?;
        let total_amount = product
            .price_per_day
            .checked_mul(Decimal::from(request.days))
            .ok_or_else(|| {
                RentalError::validation(
                    format!("rental request for product {}", product.id),
                    "price_per_day",
                    "total exceeds supported range",
                )
            })?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let mut delivery = request.delivery;
        delivery.address = delivery.address.trim().to_string();
        delivery.contact_phone = delivery.contact_phone.trim().to_string();
        delivery.location_address = delivery
            .location_address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(Self {
            id,
            renter_id,
            product_id: product.id,
            vendor_id: product.vendor_id,
            start_date: request.start_date,
            end_date,
            status: RentalStatus::Pending,
            total_amount,
            payment_intent_id: None,
            delivery,
            handed_over_at: None,
            returned_at: None,
            fine_amount: Decimal::ZERO,
            daily_fine,
            return_request: ReturnRequest::default(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Applies `action` in place. On error the rental is left unchanged.
    pub fn apply(
        &mut self,
        action: RentalAction,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityEffect, RentalError> {
        let effect = match action {
            RentalAction::Confirm => {
                self.expect_status(RentalStatus::Pending, "only PENDING rentals can be confirmed")?;
                self.status = RentalStatus::Active;
                AvailabilityEffect::Keep
            }
            RentalAction::Handover => {
                self.handed_over_at = Some(now);
                AvailabilityEffect::Keep
            }
            RentalAction::RequestReturn { note, image_url } => {
                self.expect_status(
                    RentalStatus::Active,
                    "a return can only be requested for an ACTIVE rental",
                )?;
                if !matches!(
                    self.return_request.status,
                    ReturnRequestStatus::None | ReturnRequestStatus::Rejected
                ) {
                    return Err(self.invalid(format!(
                        "a return request is already {}",
                        self.return_request.status
                    )));
                }
                self.return_request = ReturnRequest {
                    status: ReturnRequestStatus::Pending,
                    note: non_blank(note),
                    image_url: non_blank(image_url),
                    requested_at: Some(now),
                    rejection_reason: None,
                    rejection_note: None,
                };
                AvailabilityEffect::Keep
            }
            RentalAction::ApproveReturn => {
                self.expect_pending_return("approved")?;
                self.returned_at = Some(now);
                self.status = RentalStatus::Completed;
                self.return_request.status = ReturnRequestStatus::Approved;
                AvailabilityEffect::Release
            }
            RentalAction::RejectReturn { reason, note } => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(RentalError::validation(
                        format!("rental {}", self.id),
                        "reason",
                        "a rejection reason is required",
                    ));
                }
                self.expect_pending_return("rejected")?;
                self.return_request.status = ReturnRequestStatus::Rejected;
                self.return_request.rejection_reason = Some(reason.to_string());
                self.return_request.rejection_note = non_blank(note);
                AvailabilityEffect::Keep
            }
            RentalAction::Cancel => {
                self.expect_status(RentalStatus::Pending, "only PENDING rentals can be cancelled")?;
                self.status = RentalStatus::Cancelled;
                AvailabilityEffect::Release
            }
        };

        self.updated_at = now;
        Ok(effect)
    }

    fn expect_status(&self, expected: RentalStatus, rule: &str) -> Result<(), RentalError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid(format!("{rule} (status is {})", self.status)))
        }
    }

    fn expect_pending_return(&self, outcome: &str) -> Result<(), RentalError> {
        if self.return_request.status == ReturnRequestStatus::Pending {
            Ok(())
        } else {
            Err(self.invalid(format!(
                "only a PENDING return request can be {outcome} (return request is {})",
                self.return_request.status
            )))
        }
    }

    fn invalid(&self, rule: String) -> RentalError {
        RentalError::invalid_state("rental", self.id, rule)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
