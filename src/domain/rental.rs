use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductId, RentalId, UserId};

/// Fine charged per overdue day unless configured otherwise (100.00).
pub const DEFAULT_DAILY_FINE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentalStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl RentalStatus {
    /// COMPLETED and CANCELLED rentals never move again.
    pub fn is_terminal(self) -> bool {
        matches!(self, RentalStatus::Completed | RentalStatus::Cancelled)
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RentalStatus::Pending => "PENDING",
            RentalStatus::Active => "ACTIVE",
            RentalStatus::Completed => "COMPLETED",
            RentalStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Sub-state of the return workflow nested inside an ACTIVE rental.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnRequestStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ReturnRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReturnRequestStatus::None => "NONE",
            ReturnRequestStatus::Pending => "PENDING",
            ReturnRequestStatus::Approved => "APPROVED",
            ReturnRequestStatus::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub status: ReturnRequestStatus,
    pub note: Option<String>,
    pub image_url: Option<String>,
    pub requested_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejection_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub address: String,
    pub contact_phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_address: Option<String>,
}

/// A renter's hold on a product over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: RentalId,
    pub renter_id: UserId,
    pub product_id: ProductId,
    /// Owner of the product when the rental was created. Kept so the
    /// vendor's history survives the listing being deleted.
    pub vendor_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RentalStatus,
    pub total_amount: Decimal,
    pub payment_intent_id: Option<String>,
    pub delivery: DeliveryDetails,
    pub handed_over_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine_amount: Decimal,
    pub daily_fine: Decimal,
    pub return_request: ReturnRequest,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Rental {
    /// PENDING and ACTIVE rentals keep their product RENTED.
    pub fn holds_product(&self) -> bool {
        !self.status.is_terminal()
    }

    /// ACTIVE, past its end date and not yet returned.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.status == RentalStatus::Active && self.end_date < today && self.returned_at.is_none()
    }
}

/// Inbound request to rent a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRental {
    pub product_id: ProductId,
    pub start_date: NaiveDate,
    pub days: u32,
    pub delivery: DeliveryDetails,
}

/// Predicates for rental listings.
#[derive(Debug, Clone, PartialEq)]
pub enum RentalQuery {
    All,
    ByRenter(UserId),
    /// Rentals of every product the vendor owned at booking time.
    ByVendor(UserId),
    ByProduct(ProductId),
    ByStatus(RentalStatus),
    ByReturnStatus(ReturnRequestStatus),
    Overdue { today: NaiveDate },
}

impl RentalQuery {
    pub fn matches(&self, rental: &Rental) -> bool {
        match self {
            RentalQuery::All => true,
            RentalQuery::ByRenter(renter_id) => &rental.renter_id == renter_id,
            RentalQuery::ByVendor(vendor_id) => &rental.vendor_id == vendor_id,
            RentalQuery::ByProduct(product_id) => &rental.product_id == product_id,
            RentalQuery::ByStatus(status) => &rental.status == status,
            RentalQuery::ByReturnStatus(status) => &rental.return_request.status == status,
            RentalQuery::Overdue { today } => rental.is_overdue_on(*today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, sample_rental};

    #[test]
    fn default_daily_fine_is_one_hundred() {
        assert_eq!(DEFAULT_DAILY_FINE.to_string(), "100.00");
    }

    #[test]
    fn overdue_requires_active_unreturned_and_past_end() {
        let today = date(2026, 3, 10);
        let mut rental = sample_rental(RentalStatus::Active);
        rental.end_date = date(2026, 3, 9);
        assert!(rental.is_overdue_on(today));

        rental.end_date = today;
        assert!(!rental.is_overdue_on(today), "due today is not overdue yet");

        rental.end_date = date(2026, 3, 9);
        rental.returned_at = Some(crate::test_support::fixture_now());
        assert!(!rental.is_overdue_on(today));

        rental.returned_at = None;
        rental.status = RentalStatus::Completed;
        assert!(!rental.is_overdue_on(today));
    }

    #[test]
    fn vendor_query_matches_recorded_vendor() {
        let rental = sample_rental(RentalStatus::Pending);

        assert!(RentalQuery::ByVendor(rental.vendor_id).matches(&rental));
        assert!(!RentalQuery::ByVendor(UserId::random()).matches(&rental));
        assert!(!RentalQuery::ByVendor(rental.renter_id).matches(&rental));
    }
}
