use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clients::{ProductClient, RentalClient};
use crate::commands::RentalGateway;
use crate::config::AppConfig;
use crate::directory::InMemoryDirectory;
use crate::lifecycle::{RentalLifecycleEngine, RentalPolicy};
use crate::store_actor::StoreActor;
use crate::SharedClock;

use super::{spawn_overdue_sweep, SystemError};

/// The running application: one store actor, the clients over it, and the
/// engine and gateway built from those clients.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct RentalSystem {
    pub directory: Arc<InMemoryDirectory>,
    pub products: ProductClient,
    pub rentals: RentalClient,
    pub engine: RentalLifecycleEngine,
    pub gateway: RentalGateway,
    handles: Vec<JoinHandle<()>>,
    sweep: Option<JoinHandle<()>>,
}

impl RentalSystem {
    pub fn new(config: &AppConfig) -> Result<Self, SystemError> {
        Self::with_clock(config, Arc::new(DefaultClock))
    }

    pub fn with_clock(config: &AppConfig, clock: SharedClock) -> Result<Self, SystemError> {
        if config.channel_capacity == 0 {
            return Err(SystemError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        if config.max_rental_days == 0 {
            return Err(SystemError::InvalidConfig(
                "max rental days must be at least 1".to_string(),
            ));
        }

        let (store_actor, store) = StoreActor::new(config.channel_capacity);
        let store_handle = tokio::spawn(store_actor.run());

        let directory = Arc::new(InMemoryDirectory::new(clock.clone()));
        let products = ProductClient::new(store.clone(), directory.clone(), clock.clone());
        let rentals = RentalClient::new(store);
        let engine = RentalLifecycleEngine::new(
            rentals.clone(),
            products.clone(),
            directory.clone(),
            clock.clone(),
            RentalPolicy::from(config),
        );
        let gateway = RentalGateway::new(engine.clone(), directory.clone());

        let sweep = config
            .overdue_sweep_secs
            .filter(|secs| *secs > 0)
            .map(|secs| spawn_overdue_sweep(rentals.clone(), clock, Duration::from_secs(secs)));

        info!(
            channel_capacity = config.channel_capacity,
            sweep = sweep.is_some(),
            "Rental system started"
        );

        Ok(Self {
            directory,
            products,
            rentals,
            engine,
            gateway,
            handles: vec![store_handle],
            sweep,
        })
    }

    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");

        if let Some(sweep) = self.sweep {
            sweep.abort();
            // An aborted task always joins with a cancellation error.
            let _ = sweep.await;
        }

        // Every client holds a sender; the store actor stops once all are gone.
        drop(self.gateway);
        drop(self.engine);
        drop(self.rentals);
        drop(self.products);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(e.into());
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
