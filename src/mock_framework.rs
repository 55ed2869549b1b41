//! # Mock Framework
//!
//! Utilities for testing the engine and clients without a running store actor.
//!
//! Use [`create_mock_store`] to get a client and a receiver, then answer the
//! requests with helpers like [`expect_get_rental`] or [`expect_commit`].

use tokio::sync::mpsc;

use crate::actor_framework::Response;
use crate::clients::StoreClient;
use crate::domain::{Product, ProductId, Rental, RentalId};
use crate::store_actor::{Committed, StoreRequest, Transaction};

/// Creates a store client whose requests land on `receiver` instead of an
/// actor, so the test decides every reply.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a GetRental request
pub async fn expect_get_rental(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(RentalId, Response<Option<Rental>>)> {
    match receiver.recv().await {
        Some(StoreRequest::GetRental { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a GetProduct request
pub async fn expect_get_product(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(ProductId, Response<Option<Product>>)> {
    match receiver.recv().await {
        Some(StoreRequest::GetProduct { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Commit request
pub async fn expect_commit(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Transaction, Response<Committed>)> {
    match receiver.recv().await {
        Some(StoreRequest::Commit { tx, respond_to }) => Some((tx, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RentalStatus;
    use crate::test_support::sample_rental;

    #[tokio::test]
    async fn test_mock_store() {
        let (client, mut receiver) = create_mock_store(10);
        let rental = sample_rental(RentalStatus::Pending);
        let id = rental.id;

        let get_task = tokio::spawn(async move { client.get_rental(id).await });

        let (requested, responder) = expect_get_rental(&mut receiver)
            .await
            .expect("Expected GetRental request");
        assert_eq!(requested, id);
        responder.send(Ok(Some(rental.clone()))).unwrap();

        let result = get_task.await.unwrap();
        assert_eq!(result, Ok(Some(rental)));
    }

    #[tokio::test]
    async fn dropped_responder_is_a_communication_error() {
        let (client, mut receiver) = create_mock_store(10);
        let task = tokio::spawn(async move { client.get_rental(RentalId::random()).await });

        let (_, responder) = expect_get_rental(&mut receiver).await.unwrap();
        drop(responder);

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            crate::store_actor::StoreError::ActorCommunicationError("Actor dropped".to_string())
        );
    }
}
