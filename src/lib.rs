//! # Recur Store
//!
//! The validated data-access layer of a container logistics scheduler.
//!
//! ## Features
//!
//! - **Entity Validators**: Locations, Releases, Trucks, Drivers, Truck Rounds and Users
//! - **Referential Integrity**: Releases must point at existing Locations, and a referenced Location cannot be removed
//! - **Typed Partial Updates**: Every supplied field is validated before the single write
//! - **Enum Registries**: Closed type sets parsed from a name or a numeric code
//! - **Pluggable Storage**: In-memory store or MongoDB behind one `DocumentStore` trait
//! - **Typed Errors**: One `StoreError` kind per failure, mapped to HTTP status codes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recur::prelude::*;
//! use std::sync::Arc;
//!
//! let addresses = StaticAddressBook::new()
//!     .with_address("55 Wellesley St E, Auckland")
//!     .with_address("1 Quay St, Auckland");
//! let store = EntityStore::new(Arc::new(InMemoryStore::new()), Arc::new(addresses));
//!
//! store
//!     .locations()
//!     .insert(
//!         NewLocation::new("Place", "55 Wellesley St E, Auckland")
//!             .with_type("Port")
//!             .with_hours("06:30", "20:00"),
//!     )
//!     .await?;
//!
//! // Fails with DEPENDENCY_VIOLATION while a release uses "Place"
//! store.locations().remove("Place").await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AddressLookup, Argon2Hasher, ContainerType, CredentialHasher, DateValue, Document,
        DocumentStore, Filter, LocationType, Patch, Reference, Registry, RegistryInput, Removal,
        StaticAddressBook, StoreError, StoreResult, TimeOfDay, TimeOfDayError, TruckType,
    };

    #[cfg(feature = "distance-matrix")]
    pub use crate::core::address::DistanceMatrixClient;

    // === Entities ===
    pub use crate::entities::{
        Driver, DriverUpdate, EntityStore, Location, LocationUpdate, NewDriver, NewLocation,
        NewRelease, NewTruck, NewUser, QuantityInput, Release, ReleaseUpdate, Round, Slot, Truck,
        TruckRounds, TruckUpdate, User, UserUpdate,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::{AddressLookupConfig, DatabaseConfig, StoreConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc, Weekday};
}
