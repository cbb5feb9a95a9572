//! Core module containing the shared infrastructure of the entity store

pub mod address;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod patch;
pub mod query;
pub mod registry;
pub mod time;

pub use address::{AddressLookup, StaticAddressBook};
pub use credentials::{Argon2Hasher, CredentialHasher};
pub use error::{StoreError, StoreResult};
pub use gateway::{DocumentStore, Reference, Removal};
pub use patch::Patch;
pub use query::{Document, Filter};
pub use registry::{ContainerType, LocationType, Registry, RegistryInput, TruckType};
pub use time::{DateValue, TimeOfDay, TimeOfDayError};
