//! Trucks in the fleet
//!
//! A truck is a unique name plus a [`TruckType`] resolved through the registry.
//! Renaming onto a name another truck already holds fails with `CONFLICT`.

use crate::core::error::{StoreError, StoreResult};
use crate::core::gateway;
use crate::core::patch::Patch;
use crate::core::query::{Document, Filter};
use crate::core::registry::{Registry, RegistryInput, TruckType};
use crate::entities::{EntityStore, check_presence, from_document, to_document, to_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

pub const COLLECTION: &str = "trucks";

const ENTITY: &str = "truck";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub name: String,
    #[serde(rename = "type")]
    pub truck_type: TruckType,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewTruck {
    #[validate(length(min = 1, message = "A name must be supplied"))]
    pub name: String,
    #[serde(rename = "type")]
    pub truck_type: Option<RegistryInput>,
}

impl NewTruck {
    pub fn new(name: &str, truck_type: impl Into<RegistryInput>) -> Self {
        Self {
            name: name.to_string(),
            truck_type: Some(truck_type.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TruckUpdate {
    #[validate(length(min = 1, message = "A name must be supplied"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub truck_type: Option<RegistryInput>,
}

impl Patch for TruckUpdate {
    const FIELDS: &'static [&'static str] = &["name", "type"];
}

fn key(name: &str) -> Filter {
    Filter::eq("name", name)
}

/// Validator for the `trucks` collection
pub struct Trucks<'a> {
    store: &'a EntityStore,
}

impl<'a> Trucks<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    pub async fn insert(&self, input: NewTruck) -> StoreResult<Truck> {
        check_presence(&input, &["name"])?;
        let truck_type = match &input.truck_type {
            Some(raw) => TruckType::parse(raw)?,
            None => {
                return Err(StoreError::MissingField(
                    "A truck type must be supplied".to_string(),
                ));
            }
        };

        let truck = Truck {
            name: input.name,
            truck_type,
        };
        let stored = self
            .store
            .documents()
            .insert(
                COLLECTION,
                Some(&key(&truck.name)),
                to_document(ENTITY, &truck)?,
            )
            .await?;

        tracing::debug!(name = %truck.name, truck_type = %truck.truck_type, "Inserted truck");
        from_document(ENTITY, stored)
    }

    pub async fn update(&self, name: &str, changes: TruckUpdate) -> StoreResult<Truck> {
        check_presence(&changes, &["name"])?;

        let documents = self.store.documents();
        let current = self
            .get(name)
            .await?
            .ok_or_else(|| gateway::not_found(COLLECTION, &key(name)))?;

        let mut set = Document::new();
        let mut unique = None;
        if let Some(new_name) = changes.name {
            if new_name != current.name {
                if documents.contains(COLLECTION, &key(&new_name)).await? {
                    return Err(gateway::conflict(COLLECTION));
                }
                unique = Some(key(&new_name));
            }
            set.insert("name".into(), Value::String(new_name));
        }
        if let Some(raw) = &changes.truck_type {
            set.insert("type".into(), to_value(ENTITY, &TruckType::parse(raw)?)?);
        }

        if set.is_empty() {
            return Ok(current);
        }

        let updated = match &unique {
            Some(unique) => {
                documents
                    .update_unique(COLLECTION, &key(name), unique, set)
                    .await?
            }
            None => documents.update(COLLECTION, &key(name), set).await?,
        };
        tracing::debug!(name = %name, "Updated truck");
        from_document(ENTITY, updated)
    }

    pub async fn remove(&self, name: &str) -> StoreResult<Truck> {
        let removed = self.store.documents().remove(COLLECTION, &key(name)).await?;
        tracing::debug!(name = %name, "Removed truck");
        from_document(ENTITY, removed)
    }

    pub async fn get(&self, name: &str) -> StoreResult<Option<Truck>> {
        self.store
            .documents()
            .get(COLLECTION, &key(name))
            .await?
            .map(|doc| from_document(ENTITY, doc))
            .transpose()
    }

    pub async fn get_all(&self) -> StoreResult<Vec<Truck>> {
        self.store
            .documents()
            .get_all(COLLECTION)
            .await?
            .into_iter()
            .map(|doc| from_document(ENTITY, doc))
            .collect()
    }

    pub async fn contains(&self, name: &str) -> StoreResult<bool> {
        self.store.documents().contains(COLLECTION, &key(name)).await
    }
}
