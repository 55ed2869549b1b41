use std::str::FromStr;

use chrono::{Days, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use rental_lifecycle::app_system::{setup_tracing, RentalSystem};
use rental_lifecycle::commands::{CommandOutcome, RentalCommand};
use rental_lifecycle::config::AppConfig;
use rental_lifecycle::directory::{Credentials, NewUser, UserDirectory};
use rental_lifecycle::domain::{
    CreateRental, CurrentUser, DeliveryDetails, Location, ProductCreate, Role,
};
use rental_lifecycle::lifecycle::RentalError;

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = AppConfig::parse();

    // Setup tracing once for the entire application
    setup_tracing(&config.log_filter);

    info!("Starting rental lifecycle demo");

    let system = RentalSystem::new(&config).map_err(|e| e.to_string())?;
    let directory = system.directory.clone();
    let gateway = system.gateway.clone();

    // Register one user per role and log them in
    let span = tracing::info_span!("user_setup");
    let (vendor, vendor_token, renter_token, admin_token) = async {
        let mut tokens = Vec::new();
        let mut vendor = None;
        for (name, email, role) in [
            ("Vera Vendor", "vera@example.com", Role::Vendor),
            ("Rey Renter", "rey@example.com", Role::Customer),
            ("Ada Admin", "ada@example.com", Role::SuperAdmin),
        ] {
            let user = directory
                .register(NewUser::new(name, email, "demo-pass", role))
                .await
                .map_err(|e| e.to_string())?;
            if role == Role::Vendor {
                vendor = Some(CurrentUser::from(&user));
            }
            let token = directory
                .authenticate(&Credentials::new(email, "demo-pass"))
                .await
                .map_err(|e| e.to_string())?;
            tokens.push(token);
        }
        let vendor = vendor.ok_or_else(|| "vendor was not registered".to_string())?;
        let mut tokens = tokens.into_iter();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(v), Some(r), Some(a)) => Ok::<_, String>((vendor, v, r, a)),
            _ => Err("missing demo tokens".to_string()),
        }
    }
    .instrument(span)
    .await?;

    // Vendor lists a camera
    let product = system
        .products
        .create_product(
            &vendor,
            ProductCreate {
                name: "Canon EOS R6".to_string(),
                category: "Cameras".to_string(),
                description: Some("Full-frame mirrorless body with 24-105mm lens".to_string()),
                price_per_day: Decimal::from_str("45.00").map_err(|e| e.to_string())?,
                location: Location {
                    label: Some("Downtown studio".to_string()),
                    latitude: Some(40.7128),
                    longitude: Some(-74.006),
                },
                vendor_name: Some("Lens Loft".to_string()),
                vendor_contact: Some("+1 555 0100".to_string()),
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    info!(product_id = %product.id, "Product listed");

    // Renter books it, and the full lifecycle runs through the command gateway
    let today = Utc::now().date_naive();
    let start_date = today.checked_add_days(Days::new(1)).ok_or("date overflow")?;
    let span = tracing::info_span!("rental_lifecycle", product_id = %product.id);
    let created = gateway
        .dispatch(
            &renter_token,
            RentalCommand::CreateRental(CreateRental {
                product_id: product.id,
                start_date,
                days: 3,
                delivery: DeliveryDetails {
                    address: "221B Baker Street, London".to_string(),
                    contact_phone: "+44 20 7946 0000".to_string(),
                    latitude: Some(51.5237),
                    longitude: Some(-0.1585),
                    location_address: None,
                },
            }),
        )
        .instrument(span.clone())
        .await
        .map_err(|e| e.to_string())?;
    let rental = match created {
        CommandOutcome::Rental(rental) => rental,
        other => {
            error!(outcome = ?other, "Booking returned no rental");
            return Err(format!("unexpected booking outcome: {other:?}"));
        }
    };
    let id = rental.id;
    info!(rental_id = %id, total = %rental.total_amount, "Rental booked");

    let result = async {
        gateway
            .dispatch(&vendor_token, RentalCommand::ConfirmRental { id })
            .await?;
        gateway
            .dispatch(&vendor_token, RentalCommand::HandoverRental { id })
            .await?;
        gateway
            .dispatch(
                &renter_token,
                RentalCommand::RequestReturn {
                    id,
                    note: Some("Left with the concierge".to_string()),
                    image_url: None,
                },
            )
            .await?;
        gateway
            .dispatch(
                &vendor_token,
                RentalCommand::RejectReturn {
                    id,
                    reason: "Lens cap missing".to_string(),
                    note: Some("Please return the lens cap".to_string()),
                },
            )
            .await?;
        gateway
            .dispatch(
                &renter_token,
                RentalCommand::RequestReturn {
                    id,
                    note: Some("Lens cap included".to_string()),
                    image_url: None,
                },
            )
            .await?;
        gateway
            .dispatch(&vendor_token, RentalCommand::ApproveReturn { id })
            .await?;

        if let CommandOutcome::Financials(view) = gateway
            .dispatch(&renter_token, RentalCommand::GetFinancials { id })
            .await?
        {
            info!(
                overdue_days = view.overdue_days,
                outstanding = %view.outstanding_fine,
                "Rental settled"
            );
        }
        if let CommandOutcome::Rentals(overdue) = gateway
            .dispatch(&admin_token, RentalCommand::ListOverdue)
            .await?
        {
            info!(count = overdue.len(), "Overdue rentals after return");
        }
        Ok::<(), RentalError>(())
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => info!("Rental lifecycle completed successfully"),
        Err(e) => error!(error = %e, retriable = e.is_retriable(), "Rental lifecycle failed"),
    }

    // Shutdown system gracefully
    drop(gateway);
    drop(directory);
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
