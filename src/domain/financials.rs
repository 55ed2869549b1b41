//! Read-only overdue and fine figures derived from a rental.
//!
//! Nothing here writes `fine_amount`; approving a return leaves it as it
//! was. The view only reports what a fine would be for a reference instant.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Rental, RentalStatus};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalFinancials {
    pub due_date: NaiveDate,
    pub overdue_days: i64,
    pub is_overdue: bool,
    pub daily_fine: Decimal,
    pub calculated_fine: Decimal,
    pub settled_fine: Decimal,
    pub outstanding_fine: Decimal,
}

impl Rental {
    /// Overdue figures as of `reference`, or as of the return if one was recorded.
    ///
    /// Only ACTIVE and COMPLETED rentals accrue overdue days; a PENDING or
    /// CANCELLED rental never had the product. `None` when the fine does not
    /// fit in a `Decimal`.
    pub fn financials(&self, reference: DateTime<Utc>) -> Option<RentalFinancials> {
        let accrues = matches!(self.status, RentalStatus::Active | RentalStatus::Completed);
        let overdue_days = if accrues {
            let due = self.end_date.and_time(NaiveTime::MIN).and_utc();
            let late_seconds = (self.returned_at.unwrap_or(reference) - due).num_seconds();
            if late_seconds > 0 {
                (late_seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
            } else {
                0
            }
        } else {
            0
        };

        let calculated_fine = Decimal::from(overdue_days).checked_mul(self.daily_fine)?;
        let is_overdue = self.status == RentalStatus::Active
            && overdue_days > 0
            && self.returned_at.is_none();
        let outstanding_fine = if is_overdue {
            calculated_fine
        } else {
            self.fine_amount
        };

        Some(RentalFinancials {
            due_date: self.end_date,
            overdue_days,
            is_overdue,
            daily_fine: self.daily_fine,
            calculated_fine,
            settled_fine: self.fine_amount,
            outstanding_fine,
        })
    }
}
