use tracing::warn;

use crate::directory::UserDirectory;
use crate::domain::{CurrentUser, Rental, Role};

use super::RentalError;

pub const VENDOR_OR_ADMIN: &[Role] = &[Role::Vendor, Role::SuperAdmin];
pub const ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// Role gate for an operation on `entity`/`id`.
pub fn require_any_role(
    directory: &dyn UserDirectory,
    caller: &CurrentUser,
    roles: &[Role],
    entity: &'static str,
    id: impl ToString,
    operation: &str,
) -> Result<(), RentalError> {
    if directory.has_any_role(caller, roles) {
        return Ok(());
    }
    let allowed: Vec<String> = roles.iter().map(Role::to_string).collect();
    warn!(caller_id = %caller.id, role = %caller.role, operation, "Role check failed");
    Err(RentalError::Forbidden {
        caller: caller.id,
        entity,
        id: id.to_string(),
        rule: format!("{operation} requires one of [{}]", allowed.join(", ")),
    })
}

/// Ownership gate: the renter who booked, or an admin.
pub fn require_renter_or_admin(
    caller: &CurrentUser,
    rental: &Rental,
    operation: &str,
) -> Result<(), RentalError> {
    if rental.renter_id == caller.id || caller.is_admin() {
        return Ok(());
    }
    warn!(caller_id = %caller.id, rental_id = %rental.id, operation, "Ownership check failed");
    Err(RentalError::Forbidden {
        caller: caller.id,
        entity: "rental",
        id: rental.id.to_string(),
        rule: format!("{operation} is limited to the renter or an admin"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RentalStatus, UserId};
    use crate::test_support::{sample_rental, RoleOnlyDirectory};

    #[test]
    fn forbidden_names_rule_and_roles() {
        let caller = CurrentUser::new(UserId::random(), Role::Customer);
        let err = require_any_role(
            &RoleOnlyDirectory,
            &caller,
            VENDOR_OR_ADMIN,
            "rental",
            "r-1",
            "confirm",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "user {} may not act on rental r-1: confirm requires one of [VENDOR, SUPERADMIN]",
                caller.id
            )
        );

        let admin = CurrentUser::new(UserId::random(), Role::SuperAdmin);
        assert_eq!(
            require_any_role(&RoleOnlyDirectory, &admin, ADMIN_ONLY, "rental", "*", "list overdue"),
            Ok(())
        );
    }

    #[test]
    fn renter_and_admin_pass_ownership_gate() {
        let rental = sample_rental(RentalStatus::Pending);
        let renter = CurrentUser::new(rental.renter_id, Role::Customer);
        let admin = CurrentUser::new(UserId::random(), Role::SuperAdmin);
        let stranger = CurrentUser::new(UserId::random(), Role::Vendor);

        assert!(require_renter_or_admin(&renter, &rental, "cancel").is_ok());
        assert!(require_renter_or_admin(&admin, &rental, "cancel").is_ok());
        assert!(matches!(
            require_renter_or_admin(&stranger, &rental, "cancel"),
            Err(RentalError::Forbidden { .. })
        ));
    }
}
