use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use tokio::sync::oneshot;

use crate::domain::{Product, ProductId, Rental, RentalId};
use crate::store_actor::StoreError;

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any record kept by the store actor must implement.
///
/// Versions start at 1 once stored and grow by one on every committed write.
/// A record with version 0 has never been stored.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Copy + Send + Sync + Display + Debug;

    /// Name used in error messages and log fields.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Entity for Rental {
    type Id = RentalId;
    const KIND: &'static str = "rental";

    fn id(&self) -> &RentalId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

// =============================================================================
// 2. THE GENERIC RESPONSE CHANNEL
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

// =============================================================================
// 3. THE VERSIONED TABLE
// =============================================================================

/// In-memory table owned by exactly one actor.
#[derive(Debug)]
pub struct Table<T: Entity> {
    rows: HashMap<T::Id, T>,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T: Entity> Table<T> {
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.rows.contains_key(id)
    }

    /// Writes a row whose version has already been settled by the caller.
    pub fn put(&mut self, row: T) {
        self.rows.insert(*row.id(), row);
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        self.rows.remove(id)
    }
}

pub fn not_found<T: Entity>(id: &T::Id) -> StoreError {
    StoreError::NotFound {
        kind: T::KIND,
        id: id.to_string(),
    }
}

/// Fails unless `current` is still at the version the writer read.
pub fn check_version<T: Entity>(current: &T, expected: u64) -> Result<(), StoreError> {
    if current.version() == expected {
        Ok(())
    } else {
        Err(StoreError::VersionConflict {
            kind: T::KIND,
            id: current.id().to_string(),
            expected,
            found: current.version(),
        })
    }
}
