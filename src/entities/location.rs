//! Locations: yards, ports and rail sites containers move between

use crate::core::error::{StoreError, StoreResult};
use crate::core::gateway::{self, Reference, Removal};
use crate::core::patch::Patch;
use crate::core::query::{Document, Filter};
use crate::core::registry::{LocationType, Registry, RegistryInput};
use crate::core::time::TimeOfDay;
use crate::entities::{EntityStore, check_presence, from_document, release, to_document, to_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

pub const COLLECTION: &str = "locations";

const ENTITY: &str = "location";

/// A stored location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub opening_time: TimeOfDay,
    pub closing_time: TimeOfDay,
    pub requires_booking: bool,
}

/// Input for [`Locations::insert`]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLocation {
    #[validate(length(min = 1, message = "A name must be supplied"))]
    pub name: String,
    #[validate(length(min = 1, message = "An address must be supplied"))]
    pub address: String,
    /// Defaults to `Yard`
    #[serde(rename = "type")]
    pub location_type: Option<RegistryInput>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub requires_booking: bool,
}

impl NewLocation {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, location_type: impl Into<RegistryInput>) -> Self {
        self.location_type = Some(location_type.into());
        self
    }

    pub fn with_hours(mut self, opening: &str, closing: &str) -> Self {
        self.opening_time = Some(opening.to_string());
        self.closing_time = Some(closing.to_string());
        self
    }

    pub fn with_booking(mut self, requires_booking: bool) -> Self {
        self.requires_booking = requires_booking;
        self
    }
}

/// Partial update for [`Locations::update`]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocationUpdate {
    #[validate(length(min = 1, message = "A name must be supplied"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "An address must be supplied"))]
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub location_type: Option<RegistryInput>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub requires_booking: Option<bool>,
}

impl Patch for LocationUpdate {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "address",
        "type",
        "openingTime",
        "closingTime",
        "requiresBooking",
    ];
}

fn key(name: &str) -> Filter {
    Filter::eq("name", name)
}

fn parse_time(label: &'static str, input: Option<&str>) -> StoreResult<TimeOfDay> {
    TimeOfDay::parse(input.unwrap_or_default())
        .map_err(|source| StoreError::InvalidTime { label, source })
}

/// Validator for the `locations` collection
pub struct Locations<'a> {
    store: &'a EntityStore,
}

impl<'a> Locations<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    async fn check_address(&self, address: &str) -> StoreResult<()> {
        if self.store.addresses().is_valid_address(address).await {
            Ok(())
        } else {
            Err(StoreError::AddressNotFound(address.to_string()))
        }
    }

    /// Validate and store a new location
    ///
    /// Name and address must both be unused.
    pub async fn insert(&self, input: NewLocation) -> StoreResult<Location> {
        check_presence(&input, &["name", "address"])?;
        self.check_address(&input.address).await?;

        let location_type = match &input.location_type {
            Some(raw) => LocationType::parse(raw)?,
            None => LocationType::default(),
        };

        let opening_time = parse_time("opening", input.opening_time.as_deref())?;
        let closing_time = parse_time("closing", input.closing_time.as_deref())?;
        if !opening_time.is_before(&closing_time) {
            return Err(StoreError::TimeOrder);
        }

        let location = Location {
            name: input.name,
            address: input.address,
            location_type,
            opening_time,
            closing_time,
            requires_booking: input.requires_booking,
        };

        let unique = Filter::eq("name", location.name.as_str())
            .or(Filter::eq("address", location.address.as_str()));
        let stored = self
            .store
            .documents()
            .insert(COLLECTION, Some(&unique), to_document(ENTITY, &location)?)
            .await?;

        tracing::debug!(name = %location.name, "Inserted location");
        from_document(ENTITY, stored)
    }

    /// Apply a partial update to the location called `name`
    ///
    /// Every supplied field is validated before anything is written. Opening and
    /// closing times are checked against each other, using the stored value for
    /// whichever one is not being changed.
    pub async fn update(&self, name: &str, changes: LocationUpdate) -> StoreResult<Location> {
        check_presence(&changes, &["name", "address"])?;

        let documents = self.store.documents();
        let current = self
            .get(name)
            .await?
            .ok_or_else(|| gateway::not_found(COLLECTION, &key(name)))?;

        let mut set = Document::new();
        let mut unique: Option<Filter> = None;

        if let Some(new_name) = changes.name {
            if new_name != current.name {
                if documents.contains(COLLECTION, &key(&new_name)).await? {
                    return Err(gateway::conflict(COLLECTION));
                }
                if let Some(release) = self.store.releases().referencing(name).await?.first() {
                    return Err(StoreError::DependencyViolation {
                        location: name.to_string(),
                        release: release.number.clone(),
                    });
                }
                unique = Some(key(&new_name));
            }
            set.insert("name".into(), Value::String(new_name));
        }

        if let Some(address) = changes.address {
            self.check_address(&address).await?;
            let taken = Filter::eq("address", address.as_str()).and(Filter::ne("name", name));
            if documents.contains(COLLECTION, &taken).await? {
                return Err(gateway::conflict(COLLECTION));
            }
            let same_address = Filter::eq("address", address.as_str());
            unique = Some(match unique {
                Some(name_taken) => name_taken.or(same_address),
                None => same_address,
            });
            set.insert("address".into(), Value::String(address));
        }

        if let Some(raw) = &changes.location_type {
            let location_type = LocationType::parse(raw)?;
            set.insert("type".into(), to_value(ENTITY, &location_type)?);
        }

        let opening = changes
            .opening_time
            .as_deref()
            .map(|t| parse_time("opening", Some(t)))
            .transpose()?;
        let closing = changes
            .closing_time
            .as_deref()
            .map(|t| parse_time("closing", Some(t)))
            .transpose()?;
        if opening.is_some() || closing.is_some() {
            let effective_opening = opening.unwrap_or(current.opening_time);
            let effective_closing = closing.unwrap_or(current.closing_time);
            if !effective_opening.is_before(&effective_closing) {
                return Err(StoreError::TimeOrder);
            }
        }
        if let Some(opening) = opening {
            set.insert("openingTime".into(), to_value(ENTITY, &opening)?);
        }
        if let Some(closing) = closing {
            set.insert("closingTime".into(), to_value(ENTITY, &closing)?);
        }

        if let Some(requires_booking) = changes.requires_booking {
            set.insert("requiresBooking".into(), Value::Bool(requires_booking));
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
        tracing::debug!(name = %name, "Updated location");
        from_document(ENTITY, updated)
    }

    /// Remove a location no release starts or ends at
    pub async fn remove(&self, name: &str) -> StoreResult<Location> {
        let reference = Reference {
            collection: release::COLLECTION,
            filter: release::references_location(name),
        };

        match self
            .store
            .documents()
            .remove_unless_referenced(COLLECTION, &key(name), &reference)
            .await?
        {
            Removal::Removed(doc) => {
                tracing::debug!(name = %name, "Removed location");
                from_document(ENTITY, doc)
            }
            Removal::Blocked(doc) => Err(StoreError::DependencyViolation {
                location: name.to_string(),
                release: release::number_of(&doc),
            }),
        }
    }

    pub async fn get(&self, name: &str) -> StoreResult<Option<Location>> {
        self.store
            .documents()
            .get(COLLECTION, &key(name))
            .await?
            .map(|doc| from_document(ENTITY, doc))
            .transpose()
    }

    pub async fn get_all(&self) -> StoreResult<Vec<Location>> {
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
