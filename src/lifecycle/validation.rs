use std::ops::RangeInclusive;

use crate::domain::CreateRental;

use super::RentalError;

const ADDRESS_LEN: RangeInclusive<usize> = 5..=255;
const PHONE_LEN: RangeInclusive<usize> = 6..=20;
const LOCATION_ADDRESS_MAX: usize = 500;

/// Shape checks on a rental request, before anything is loaded.
pub fn validate_create(request: &CreateRental, max_days: u32) -> Result<(), RentalError> {
    let subject = format!("rental request for product {}", request.product_id);

    if !(1..=max_days).contains(&request.days) {
        return Err(RentalError::validation(
            subject,
            "days",
            format!("must be between 1 and {max_days}, got {}", request.days),
        ));
    }

    let delivery = &request.delivery;
    check_length(&subject, "delivery_address", &delivery.address, ADDRESS_LEN)?;
    check_length(&subject, "contact_phone", &delivery.contact_phone, PHONE_LEN)?;

    if let Some(lat) = delivery.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RentalError::validation(
                subject,
                "delivery_latitude",
                format!("must be within [-90, 90], got {lat}"),
            ));
        }
    }
    if let Some(lng) = delivery.longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(RentalError::validation(
                subject,
                "delivery_longitude",
                format!("must be within [-180, 180], got {lng}"),
            ));
        }
    }
    if let Some(location) = &delivery.location_address {
        if location.trim().chars().count() > LOCATION_ADDRESS_MAX {
            return Err(RentalError::validation(
                subject,
                "delivery_location_address",
                format!("must be at most {LOCATION_ADDRESS_MAX} characters"),
            ));
        }
    }

    Ok(())
}

fn check_length(
    subject: &str,
    field: &'static str,
    value: &str,
    allowed: RangeInclusive<usize>,
) -> Result<(), RentalError> {
    let len = value.trim().chars().count();
    if allowed.contains(&len) {
        Ok(())
    } else {
        Err(RentalError::validation(
            subject,
            field,
            format!(
                "must be {} to {} characters, got {len}",
                allowed.start(),
                allowed.end()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_support::rental_request;
    use crate::domain::ProductId;

    #[test]
    fn well_formed_request_passes() {
        assert_eq!(validate_create(&rental_request(ProductId::random(), 3), 60), Ok(()));
    }

    #[rstest]
    #[case(0)]
    #[case(61)]
    fn days_outside_window_are_rejected(#[case] days: u32) {
        let err = validate_create(&rental_request(ProductId::random(), days), 60).unwrap_err();
        assert!(matches!(err, RentalError::Validation { field: "days", .. }));
    }

    #[rstest]
    #[case::short_address(|r: &mut CreateRental| r.delivery.address = "  x ".into(), "delivery_address")]
    #[case::short_phone(|r: &mut CreateRental| r.delivery.contact_phone = "123".into(), "contact_phone")]
    #[case::long_phone(|r: &mut CreateRental| r.delivery.contact_phone = "1".repeat(21), "contact_phone")]
    #[case::latitude(|r: &mut CreateRental| r.delivery.latitude = Some(91.0), "delivery_latitude")]
    #[case::longitude(|r: &mut CreateRental| r.delivery.longitude = Some(-180.5), "delivery_longitude")]
    #[case::location(|r: &mut CreateRental| r.delivery.location_address = Some("a".repeat(501)), "delivery_location_address")]
    fn delivery_rules(#[case] tweak: fn(&mut CreateRental), #[case] field: &'static str) {
        let mut request = rental_request(ProductId::random(), 3);
        tweak(&mut request);
        let err = validate_create(&request, 60).unwrap_err();
        match err {
            RentalError::Validation { field: f, subject, .. } => {
                assert_eq!(f, field);
                assert!(subject.contains(&request.product_id.to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
