//! Rental lifecycle engine for a peer-to-peer rental marketplace.
//!
//! All product and rental records live behind one store actor. Lifecycle
//! transitions are committed as a single [`store_actor::Transaction`] so a
//! rental and its product's availability flag always move together.

use std::sync::Arc;

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod commands;
pub mod config;
pub mod directory;
pub mod domain;
pub mod lifecycle;
pub mod store_actor;

#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod test_support;

/// Source of "now" shared by the engine, the product store and the directory.
pub type SharedClock = Arc<dyn mockable::Clock + Send + Sync>;
