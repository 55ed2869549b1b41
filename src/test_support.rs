//! Fixtures shared by the unit and integration tests.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;

use crate::clients::{ProductClient, RentalClient, StoreClient};
use crate::commands::RentalGateway;
use crate::directory::{
    AuthError, AuthToken, Credentials, InMemoryDirectory, NewUser, UserDirectory,
};
use crate::domain::{
    CreateRental, CurrentUser, DeliveryDetails, Location, Product, ProductCreate, ProductId,
    Rental, RentalId, RentalStatus, ReturnRequest, Role, UserId, DEFAULT_DAILY_FINE,
};
use crate::lifecycle::{RentalLifecycleEngine, RentalPolicy};
use crate::store_actor::StoreActor;
use crate::SharedClock;

pub fn fixture_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single() {
        Some(now) => now,
        None => panic!("valid fixture timestamp"),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => date,
        None => panic!("invalid fixture date {y}-{m}-{d}"),
    }
}

/// Clock pinned to [`fixture_now`] that tests can move forward.
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

pub fn fixture_clock() -> SharedClock {
    Arc::new(FixtureClock::new(fixture_now()))
}

/// Grants roles purely from the caller's role field and knows no tokens.
pub struct RoleOnlyDirectory;

#[async_trait]
impl UserDirectory for RoleOnlyDirectory {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<AuthToken, AuthError> {
        Err(AuthError::InvalidCredentials)
    }

    async fn current_user(&self, _token: &AuthToken) -> Result<CurrentUser, AuthError> {
        Err(AuthError::InvalidToken)
    }
}

/// Lowest bcrypt work factor; keeps registration fast in tests.
pub const TEST_HASH_COST: u32 = 4;

pub fn price(value: &str) -> Decimal {
    match Decimal::from_str(value) {
        Ok(price) => price,
        Err(e) => panic!("bad fixture price {value}: {e}"),
    }
}

pub fn product_params(price_per_day: &str) -> ProductCreate {
    ProductCreate {
        name: "Canon EOS R6".to_string(),
        category: "Cameras".to_string(),
        description: Some("Full-frame mirrorless body".to_string()),
        price_per_day: price(price_per_day),
        location: Location {
            label: Some("Downtown".to_string()),
            latitude: Some(40.7128),
            longitude: Some(-74.006),
        },
        vendor_name: Some("Lens Loft".to_string()),
        vendor_contact: Some("+1 555 0100".to_string()),
    }
}

pub fn sample_product(vendor_id: UserId, price_per_day: &str) -> Product {
    Product::list(ProductId::random(), vendor_id, product_params(price_per_day), fixture_now())
}

pub fn delivery() -> DeliveryDetails {
    DeliveryDetails {
        address: "221B Baker Street".to_string(),
        contact_phone: "+44 20 7946 0000".to_string(),
        latitude: Some(51.5237),
        longitude: Some(-0.1585),
        location_address: None,
    }
}

pub fn rental_request(product_id: ProductId, days: u32) -> CreateRental {
    CreateRental {
        product_id,
        start_date: date(2026, 3, 2),
        days,
        delivery: delivery(),
    }
}

pub fn sample_rental_for(product: &Product, status: RentalStatus) -> Rental {
    Rental {
        id: RentalId::random(),
        renter_id: UserId::random(),
        product_id: product.id,
        vendor_id: product.vendor_id,
        start_date: date(2026, 3, 1),
        end_date: date(2026, 3, 4),
        status,
        total_amount: price("30.00"),
        payment_intent_id: None,
        delivery: delivery(),
        handed_over_at: None,
        returned_at: None,
        fine_amount: Decimal::ZERO,
        daily_fine: DEFAULT_DAILY_FINE,
        return_request: ReturnRequest::default(),
        created_at: fixture_now(),
        updated_at: fixture_now(),
        version: 0,
    }
}

pub fn sample_rental(status: RentalStatus) -> Rental {
    sample_rental_for(&sample_product(UserId::random(), "10.00"), status)
}

/// A fully wired store, directory and engine with one user per role.
pub struct TestHarness {
    pub clock: Arc<FixtureClock>,
    pub directory: Arc<InMemoryDirectory>,
    pub store: StoreClient,
    pub products: ProductClient,
    pub rentals: RentalClient,
    pub engine: RentalLifecycleEngine,
    pub gateway: RentalGateway,
    pub vendor: CurrentUser,
    pub customer: CurrentUser,
    pub admin: CurrentUser,
    pub vendor_token: AuthToken,
    pub customer_token: AuthToken,
    pub admin_token: AuthToken,
}

impl TestHarness {
    pub async fn start() -> Self {
        let clock = Arc::new(FixtureClock::new(fixture_now()));
        let shared_clock: SharedClock = clock.clone();
        let directory = Arc::new(InMemoryDirectory::with_hash_cost(
            shared_clock.clone(),
            TEST_HASH_COST,
        ));

        let (actor, store) = StoreActor::new(32);
        tokio::spawn(actor.run());

        let products = ProductClient::new(store.clone(), directory.clone(), shared_clock.clone());
        let rentals = RentalClient::new(store.clone());
        let engine = RentalLifecycleEngine::new(
            rentals.clone(),
            products.clone(),
            directory.clone(),
            shared_clock,
            RentalPolicy::default(),
        );
        let gateway = RentalGateway::new(engine.clone(), directory.clone());

        let (vendor, vendor_token) = register(&directory, "vendor@example.com", Role::Vendor).await;
        let (customer, customer_token) =
            register(&directory, "customer@example.com", Role::Customer).await;
        let (admin, admin_token) =
            register(&directory, "admin@example.com", Role::SuperAdmin).await;

        Self {
            clock,
            directory,
            store,
            products,
            rentals,
            engine,
            gateway,
            vendor,
            customer,
            admin,
            vendor_token,
            customer_token,
            admin_token,
        }
    }

    pub async fn register_vendor(&self, email: &str) -> CurrentUser {
        register(&self.directory, email, Role::Vendor).await.0
    }

    pub async fn register_customer(&self, email: &str) -> (CurrentUser, AuthToken) {
        register(&self.directory, email, Role::Customer).await
    }

    pub async fn listed_product(&self, price_per_day: &str) -> Product {
        self.products
            .create_product(&self.vendor, product_params(price_per_day))
            .await
            .unwrap()
    }

    pub async fn product(&self, id: ProductId) -> Product {
        self.products.require_product(id).await.unwrap()
    }

    /// A rental by [`Self::customer`] on a fresh 10.00/day product.
    pub async fn pending_rental(&self) -> (Product, Rental) {
        let product = self.listed_product("10.00").await;
        let rental = self
            .engine
            .create_rental(&self.customer, rental_request(product.id, 3))
            .await
            .unwrap();
        (product, rental)
    }

    pub async fn active_rental(&self) -> (Product, Rental) {
        let (product, rental) = self.pending_rental().await;
        let rental = self.engine.confirm_rental(&self.vendor, rental.id).await.unwrap();
        (product, rental)
    }
}

async fn register(
    directory: &InMemoryDirectory,
    email: &str,
    role: Role,
) -> (CurrentUser, AuthToken) {
    let user = directory
        .register(NewUser::new("Fixture User", email, "fixture-pass", role))
        .await
        .unwrap();
    let token = directory
        .authenticate(&Credentials::new(email, "fixture-pass"))
        .await
        .unwrap();
    (CurrentUser::from(&user), token)
}
