//! Entity validators and the store that hands them out
//!
//! [`EntityStore`] owns the injected collaborators: the document store, the
//! address lookup service and the password hasher. Each entity service
//! (`store.locations()`, `store.releases()`, ...) borrows the store, so a
//! validator needing another entity goes through that entity's own service.
//!
//! ```rust,ignore
//! let store = EntityStore::new(Arc::new(InMemoryStore::new()), Arc::new(address_book));
//!
//! store.locations().insert(NewLocation::new("Place", "55 Wellesley St E, Auckland")
//!     .with_hours("06:30", "20:00")).await?;
//! ```

pub mod driver;
pub mod location;
pub mod release;
pub mod rounds;
pub mod truck;
pub mod user;

pub use driver::{Driver, DriverUpdate, Drivers, NewDriver};
pub use location::{Location, LocationUpdate, Locations, NewLocation};
pub use release::{NewRelease, QuantityInput, Release, ReleaseUpdate, Releases};
pub use rounds::{Round, Slot, TruckRounds, TruckRoundsService};
pub use truck::{NewTruck, Truck, TruckUpdate, Trucks};
pub use user::{NewUser, User, UserUpdate, Users};

use crate::core::address::AddressLookup;
use crate::core::credentials::{Argon2Hasher, CredentialHasher};
use crate::core::error::{StoreError, StoreResult};
use crate::core::gateway::DocumentStore;
use crate::core::query::Document;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Entry point to every entity validator
#[derive(Clone)]
pub struct EntityStore {
    documents: Arc<dyn DocumentStore>,
    addresses: Arc<dyn AddressLookup>,
    hasher: Arc<dyn CredentialHasher>,
}

impl EntityStore {
    /// Create a store with the default Argon2 password hasher
    pub fn new(documents: Arc<dyn DocumentStore>, addresses: Arc<dyn AddressLookup>) -> Self {
        Self {
            documents,
            addresses,
            hasher: Arc::new(Argon2Hasher::new()),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// The underlying document store
    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn addresses(&self) -> &Arc<dyn AddressLookup> {
        &self.addresses
    }

    pub fn locations(&self) -> Locations<'_> {
        Locations::new(self)
    }

    pub fn releases(&self) -> Releases<'_> {
        Releases::new(self)
    }

    pub fn trucks(&self) -> Trucks<'_> {
        Trucks::new(self)
    }

    pub fn drivers(&self) -> Drivers<'_> {
        Drivers::new(self)
    }

    pub fn truck_rounds(&self) -> TruckRoundsService<'_> {
        TruckRoundsService::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

pub(crate) fn to_document<T: Serialize>(entity: &str, value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::serialization(entity, "expected an object")),
        Err(e) => Err(StoreError::serialization(entity, e)),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(entity: &str, doc: Document) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::serialization(entity, e))
}

pub(crate) fn to_value<T: Serialize>(entity: &str, value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::serialization(entity, e))
}

/// Fail with the first presence error, checking fields in `order`
pub(crate) fn check_presence<T: Validate>(input: &T, order: &[&str]) -> StoreResult<()> {
    let Err(errors) = input.validate() else {
        return Ok(());
    };

    let fields = errors.field_errors();
    let message = order
        .iter()
        .filter_map(|field| fields.get(*field))
        .filter_map(|errs| errs.first())
        .find_map(|err| err.message.as_ref())
        .map(|message| message.to_string())
        .unwrap_or_else(|| errors.to_string());

    Err(StoreError::MissingField(message))
}
