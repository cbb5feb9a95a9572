//! Drivers and the days they work
//!
//! Only the name is checked. Names are not unique, so every operation acts on
//! the first driver with the given name. `avoidLocations` is stored exactly as
//! supplied.

use crate::core::error::StoreResult;
use crate::core::gateway;
use crate::core::patch::Patch;
use crate::core::query::{Document, Filter};
use crate::entities::{EntityStore, check_presence, from_document, to_document, to_value};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

pub const COLLECTION: &str = "drivers";

const ENTITY: &str = "driver";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub name: String,
    #[serde(default)]
    pub available_days: Vec<Weekday>,
    #[serde(default)]
    pub avoid_locations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewDriver {
    #[validate(length(min = 1, message = "A name must be supplied"))]
    pub name: String,
    pub available_days: Vec<Weekday>,
    pub avoid_locations: Vec<String>,
}

impl NewDriver {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn available_on(mut self, days: &[Weekday]) -> Self {
        self.available_days = days.to_vec();
        self
    }

    pub fn avoiding(mut self, locations: &[&str]) -> Self {
        self.avoid_locations = locations.iter().map(|l| l.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DriverUpdate {
    #[validate(length(min = 1, message = "A name must be supplied"))]
    pub name: Option<String>,
    pub available_days: Option<Vec<Weekday>>,
    pub avoid_locations: Option<Vec<String>>,
}

impl Patch for DriverUpdate {
    const FIELDS: &'static [&'static str] = &["name", "availableDays", "avoidLocations"];
}

fn key(name: &str) -> Filter {
    Filter::eq("name", name)
}

/// Validator for the `drivers` collection
pub struct Drivers<'a> {
    store: &'a EntityStore,
}

impl<'a> Drivers<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    pub async fn insert(&self, input: NewDriver) -> StoreResult<Driver> {
        check_presence(&input, &["name"])?;

        let driver = Driver {
            name: input.name,
            available_days: input.available_days,
            avoid_locations: input.avoid_locations,
        };
        let stored = self
            .store
            .documents()
            .insert(COLLECTION, None, to_document(ENTITY, &driver)?)
            .await?;

        tracing::debug!(name = %driver.name, "Inserted driver");
        from_document(ENTITY, stored)
    }

    pub async fn update(&self, name: &str, changes: DriverUpdate) -> StoreResult<Driver> {
        check_presence(&changes, &["name"])?;

        let mut set = Document::new();
        if let Some(new_name) = changes.name {
            set.insert("name".into(), Value::String(new_name));
        }
        if let Some(days) = &changes.available_days {
            set.insert("availableDays".into(), to_value(ENTITY, days)?);
        }
        if let Some(locations) = changes.avoid_locations {
            set.insert("avoidLocations".into(), to_value(ENTITY, &locations)?);
        }

        let documents = self.store.documents();
        if set.is_empty() {
            return documents
                .get(COLLECTION, &key(name))
                .await?
                .ok_or_else(|| gateway::not_found(COLLECTION, &key(name)))
                .and_then(|doc| from_document(ENTITY, doc));
        }

        let updated = documents.update(COLLECTION, &key(name), set).await?;
        tracing::debug!(name = %name, "Updated driver");
        from_document(ENTITY, updated)
    }

    pub async fn remove(&self, name: &str) -> StoreResult<Driver> {
        let removed = self.store.documents().remove(COLLECTION, &key(name)).await?;
        tracing::debug!(name = %name, "Removed driver");
        from_document(ENTITY, removed)
    }

    pub async fn get(&self, name: &str) -> StoreResult<Option<Driver>> {
        self.store
            .documents()
            .get(COLLECTION, &key(name))
            .await?
            .map(|doc| from_document(ENTITY, doc))
            .transpose()
    }

    pub async fn get_all(&self) -> StoreResult<Vec<Driver>> {
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
