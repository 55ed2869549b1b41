//! Inbound command boundary: resolves the bearer token, applies the
//! ownership gates, and forwards to the engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::directory::{AuthToken, UserDirectory};
use crate::domain::{CreateRental, CurrentUser, Rental, RentalFinancials, RentalId};
use crate::lifecycle::guards::require_renter_or_admin;
use crate::lifecycle::{RentalError, RentalLifecycleEngine};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum RentalCommand {
    CreateRental(CreateRental),
    ConfirmRental {
        id: RentalId,
    },
    HandoverRental {
        id: RentalId,
    },
    #[serde(rename_all = "camelCase")]
    RequestReturn {
        id: RentalId,
        #[serde(default)]
        note: Option<String>,
        #[serde(default)]
        image_url: Option<String>,
    },
    ApproveReturn {
        id: RentalId,
    },
    RejectReturn {
        id: RentalId,
        reason: String,
        #[serde(default)]
        note: Option<String>,
    },
    CancelRental {
        id: RentalId,
    },
    ListOverdue,
    GetRental {
        id: RentalId,
    },
    ListMyRentals,
    ListVendorRentals,
    GetFinancials {
        id: RentalId,
    },
}

impl RentalCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RentalCommand::CreateRental(_) => "createRental",
            RentalCommand::ConfirmRental { .. } => "confirmRental",
            RentalCommand::HandoverRental { .. } => "handoverRental",
            RentalCommand::RequestReturn { .. } => "requestReturn",
            RentalCommand::ApproveReturn { .. } => "approveReturn",
            RentalCommand::RejectReturn { .. } => "rejectReturn",
            RentalCommand::CancelRental { .. } => "cancelRental",
            RentalCommand::ListOverdue => "listOverdue",
            RentalCommand::GetRental { .. } => "getRental",
            RentalCommand::ListMyRentals => "listMyRentals",
            RentalCommand::ListVendorRentals => "listVendorRentals",
            RentalCommand::GetFinancials { .. } => "getFinancials",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum CommandOutcome {
    Rental(Box<Rental>),
    Rentals(Vec<Rental>),
    Financials(RentalFinancials),
}

impl CommandOutcome {
    fn rental(rental: Rental) -> Self {
        CommandOutcome::Rental(Box::new(rental))
    }
}

#[derive(Clone)]
pub struct RentalGateway {
    engine: RentalLifecycleEngine,
    directory: Arc<dyn UserDirectory>,
}

impl RentalGateway {
    pub fn new(engine: RentalLifecycleEngine, directory: Arc<dyn UserDirectory>) -> Self {
        Self { engine, directory }
    }

    #[instrument(fields(command = command.name()), skip(self, token, command))]
    pub async fn dispatch(
        &self,
        token: &AuthToken,
        command: RentalCommand,
    ) -> Result<CommandOutcome, RentalError> {
        let caller = self.directory.current_user(token).await.inspect_err(|e| {
            warn!(error = %e, "Unauthenticated command");
        })?;
        debug!(caller_id = %caller.id, role = %caller.role, "Caller resolved");

        let engine = &self.engine;
        let outcome = match command {
            RentalCommand::CreateRental(request) => {
                CommandOutcome::rental(engine.create_rental(&caller, request).await?)
            }
            RentalCommand::ConfirmRental { id } => {
                CommandOutcome::rental(engine.confirm_rental(&caller, id).await?)
            }
            RentalCommand::HandoverRental { id } => {
                CommandOutcome::rental(engine.handover_rental(&caller, id).await?)
            }
            RentalCommand::RequestReturn { id, note, image_url } => {
                let rental = engine.get_rental(id).await?;
                require_renter_or_admin(&caller, &rental, "request return")?;
                CommandOutcome::rental(engine.request_return(&caller, id, note, image_url).await?)
            }
            RentalCommand::ApproveReturn { id } => {
                CommandOutcome::rental(engine.approve_return(&caller, id).await?)
            }
            RentalCommand::RejectReturn { id, reason, note } => {
                CommandOutcome::rental(engine.reject_return(&caller, id, reason, note).await?)
            }
            RentalCommand::CancelRental { id } => {
                let rental = engine.get_rental(id).await?;
                require_renter_or_admin(&caller, &rental, "cancel")?;
                CommandOutcome::rental(engine.cancel_rental(&caller, id).await?)
            }
            RentalCommand::ListOverdue => {
                CommandOutcome::Rentals(engine.list_overdue(&caller).await?)
            }
            RentalCommand::GetRental { id } => {
                let rental = self.visible_rental(&caller, id, "view").await?;
                CommandOutcome::rental(rental)
            }
            RentalCommand::ListMyRentals => {
                CommandOutcome::Rentals(engine.list_for_renter(&caller).await?)
            }
            RentalCommand::ListVendorRentals => {
                CommandOutcome::Rentals(engine.list_for_vendor(&caller).await?)
            }
            RentalCommand::GetFinancials { id } => {
                self.visible_rental(&caller, id, "view financials").await?;
                CommandOutcome::Financials(engine.financials(id).await?)
            }
        };

        Ok(outcome)
    }

    /// The renter, the product's vendor, or an admin may read a rental.
    async fn visible_rental(
        &self,
        caller: &CurrentUser,
        id: RentalId,
        operation: &str,
    ) -> Result<Rental, RentalError> {
        let rental = self.engine.get_rental(id).await?;
        if require_renter_or_admin(caller, &rental, operation).is_ok() {
            return Ok(rental);
        }
        if rental.vendor_id == caller.id {
            return Ok(rental);
        }
        warn!(caller_id = %caller.id, rental_id = %id, "Read refused");
        Err(RentalError::Forbidden {
            caller: caller.id,
            entity: "rental",
            id: id.to_string(),
            rule: format!("{operation} is limited to the renter, the product's vendor or an admin"),
        })
    }
}
