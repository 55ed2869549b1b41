use std::time::Duration;

use mockable::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

use crate::clients::RentalClient;
use crate::lifecycle::RentalError;
use crate::SharedClock;

/// Logs the overdue set every `period` until the store goes away.
///
/// Read-only: running it twice, or not at all, changes nothing.
pub fn spawn_overdue_sweep(
    rentals: RentalClient,
    clock: SharedClock,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_sweep(rentals, clock, period))
}

#[instrument(name = "overdue_sweep", skip(rentals, clock))]
async fn run_sweep(rentals: RentalClient, clock: SharedClock, period: Duration) {
    info!("Overdue sweep starting");
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let today = clock.utc().date_naive();
        match rentals.list_overdue(today).await {
            Ok(overdue) if overdue.is_empty() => info!(%today, "No overdue rentals"),
            Ok(overdue) => {
                for rental in &overdue {
                    warn!(
                        rental_id = %rental.id,
                        renter_id = %rental.renter_id,
                        end_date = %rental.end_date,
                        "Rental overdue"
                    );
                }
                info!(%today, count = overdue.len(), "Overdue sweep finished");
            }
            Err(RentalError::ActorCommunicationError(e)) => {
                info!(reason = %e, "Store closed, overdue sweep stopping");
                break;
            }
            Err(e) => error!(error = %e, "Overdue sweep failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_actor::StoreActor;
    use crate::test_support::fixture_clock;

    #[tokio::test]
    async fn sweep_keeps_running_until_aborted() {
        let (actor, store) = StoreActor::new(8);
        let actor_handle = tokio::spawn(actor.run());

        let sweep = spawn_overdue_sweep(
            RentalClient::new(store.clone()),
            fixture_clock(),
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sweep.is_finished());

        // The sweep's own client keeps the actor alive, so abort it first.
        sweep.abort();
        drop(store);
        actor_handle.await.unwrap();
    }

    #[tokio::test]
    async fn sweep_exits_on_closed_channel() {
        let (actor, store) = StoreActor::new(8);
        drop(actor);

        let sweep = spawn_overdue_sweep(
            RentalClient::new(store),
            fixture_clock(),
            Duration::from_millis(5),
        );
        tokio::time::timeout(Duration::from_secs(1), sweep)
            .await
            .expect("sweep should stop on its own")
            .unwrap();
    }
}
