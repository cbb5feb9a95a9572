//! Releases: client orders to move containers between two locations
//!
//! A release carries a 20ft and a 40ft quantity, an acceptance/cutoff date
//! window and the names of its source and destination locations. Both
//! locations must exist when the release is written, and
//! [`Locations::remove`](crate::entities::Locations::remove) refuses to delete
//! a location any release still points at.

use crate::core::error::{StoreError, StoreResult};
use crate::core::gateway;
use crate::core::patch::Patch;
use crate::core::query::{Document, Filter};
use crate::core::time::{DateValue, format_date};
use crate::entities::{EntityStore, check_presence, from_document, to_document, to_value};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

pub const COLLECTION: &str = "releases";

const ENTITY: &str = "release";

/// A stored release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub number: String,
    pub client: String,
    #[serde(rename = "quantity20ft")]
    pub quantity_20ft: u32,
    #[serde(rename = "quantity40ft")]
    pub quantity_40ft: u32,
    pub acceptance_date: NaiveDate,
    pub cutoff_date: NaiveDate,
    pub from: String,
    pub to: String,
}

/// A quantity as supplied by a caller
///
/// Negative numbers, fractions and non-numbers still decode so that
/// validation can reject them with `INVALID_QUANTITY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Count(i64),
    Other(Value),
}

impl QuantityInput {
    /// The quantity as a container count, if it is a non-negative integer
    pub fn count(&self) -> Option<u32> {
        match self {
            QuantityInput::Count(count) => u32::try_from(*count).ok(),
            QuantityInput::Other(Value::Number(number)) => number
                .as_f64()
                .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
                .map(|n| n as u32),
            QuantityInput::Other(_) => None,
        }
    }
}

impl Default for QuantityInput {
    fn default() -> Self {
        QuantityInput::Count(0)
    }
}

impl From<i64> for QuantityInput {
    fn from(count: i64) -> Self {
        QuantityInput::Count(count)
    }
}

impl std::fmt::Display for QuantityInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityInput::Count(count) => write!(f, "{}", count),
            QuantityInput::Other(Value::String(text)) => f.write_str(text),
            QuantityInput::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Input for [`Releases::insert`]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewRelease {
    #[serde(deserialize_with = "string_or_number")]
    #[validate(length(min = 1, message = "A release number is required"))]
    pub number: String,
    #[validate(length(min = 1, message = "A client is required"))]
    pub client: String,
    #[serde(rename = "quantity20ft")]
    pub quantity_20ft: QuantityInput,
    #[serde(rename = "quantity40ft")]
    pub quantity_40ft: QuantityInput,
    pub acceptance_date: Option<DateValue>,
    pub cutoff_date: Option<DateValue>,
    pub from: String,
    pub to: String,
}

impl NewRelease {
    pub fn new(number: &str, client: &str) -> Self {
        Self {
            number: number.to_string(),
            client: client.to_string(),
            ..Default::default()
        }
    }

    pub fn with_quantities(mut self, quantity_20ft: i64, quantity_40ft: i64) -> Self {
        self.quantity_20ft = quantity_20ft.into();
        self.quantity_40ft = quantity_40ft.into();
        self
    }

    pub fn with_dates(
        mut self,
        acceptance: impl Into<DateValue>,
        cutoff: impl Into<DateValue>,
    ) -> Self {
        self.acceptance_date = Some(acceptance.into());
        self.cutoff_date = Some(cutoff.into());
        self
    }

    pub fn between(mut self, from: &str, to: &str) -> Self {
        self.from = from.to_string();
        self.to = to.to_string();
        self
    }
}

/// Partial update for [`Releases::update`]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleaseUpdate {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    #[validate(length(min = 1, message = "A release number is required"))]
    pub number: Option<String>,
    #[validate(length(min = 1, message = "A client is required"))]
    pub client: Option<String>,
    #[serde(rename = "quantity20ft")]
    pub quantity_20ft: Option<QuantityInput>,
    #[serde(rename = "quantity40ft")]
    pub quantity_40ft: Option<QuantityInput>,
    pub acceptance_date: Option<DateValue>,
    pub cutoff_date: Option<DateValue>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Patch for ReleaseUpdate {
    const FIELDS: &'static [&'static str] = &[
        "number",
        "client",
        "quantity20ft",
        "quantity40ft",
        "acceptanceDate",
        "cutoffDate",
        "from",
        "to",
    ];
}

/// Releases starting or ending at `location`
pub fn references_location(location: &str) -> Filter {
    Filter::eq("from", location).or(Filter::eq("to", location))
}

/// Release number of a stored release document
pub(crate) fn number_of(doc: &Document) -> String {
    match doc.get("number") {
        Some(Value::String(number)) => number.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn key(number: &str) -> Filter {
    Filter::eq("number", number)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawNumber> for String {
    fn from(raw: RawNumber) -> Self {
        match raw {
            RawNumber::Text(text) => text,
            RawNumber::Number(number) => number.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawNumber>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

fn check_quantity(label: &'static str, input: &QuantityInput) -> StoreResult<u32> {
    input.count().ok_or_else(|| StoreError::InvalidQuantity {
        label,
        value: input.to_string(),
    })
}

fn resolve_date(value: Option<&DateValue>) -> StoreResult<NaiveDate> {
    match value {
        Some(value) => value
            .resolve()
            .ok_or_else(|| StoreError::InvalidDate(value.to_string())),
        None => Err(StoreError::InvalidDate(String::new())),
    }
}

fn check_date_order(acceptance: NaiveDate, cutoff: NaiveDate) -> StoreResult<()> {
    if acceptance < cutoff {
        Ok(())
    } else {
        Err(StoreError::DateOrder {
            acceptance: format_date(acceptance),
            cutoff: format_date(cutoff),
        })
    }
}

/// Validator for the `releases` collection
pub struct Releases<'a> {
    store: &'a EntityStore,
}

impl<'a> Releases<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    async fn check_location(&self, name: &str) -> StoreResult<()> {
        if self.store.locations().contains(name).await? {
            Ok(())
        } else {
            Err(StoreError::AddressNotFound(name.to_string()))
        }
    }

    /// Validate and store a new release
    pub async fn insert(&self, input: NewRelease) -> StoreResult<Release> {
        check_presence(&input, &["number", "client"])?;

        let quantity_20ft = check_quantity("20ft", &input.quantity_20ft)?;
        let quantity_40ft = check_quantity("40ft", &input.quantity_40ft)?;
        if quantity_20ft == 0 && quantity_40ft == 0 {
            return Err(StoreError::ZeroQuantity);
        }

        let acceptance_date = resolve_date(input.acceptance_date.as_ref())?;
        let cutoff_date = resolve_date(input.cutoff_date.as_ref())?;
        check_date_order(acceptance_date, cutoff_date)?;

        if input.from == input.to {
            return Err(StoreError::IdenticalEndpoints);
        }
        self.check_location(&input.from).await?;
        self.check_location(&input.to).await?;

        let release = Release {
            number: input.number,
            client: input.client,
            quantity_20ft,
            quantity_40ft,
            acceptance_date,
            cutoff_date,
            from: input.from,
            to: input.to,
        };

        let stored = self
            .store
            .documents()
            .insert(
                COLLECTION,
                Some(&key(&release.number)),
                to_document(ENTITY, &release)?,
            )
            .await?;

        tracing::debug!(number = %release.number, from = %release.from, to = %release.to, "Inserted release");
        from_document(ENTITY, stored)
    }

    /// Apply a partial update to the release numbered `number`
    ///
    /// Cross-field rules use the stored value of any counterpart field the
    /// update leaves out: changing only `quantity20ft` is checked against the
    /// stored `quantity40ft`, changing only `cutoffDate` against the stored
    /// `acceptanceDate`, and so on. Nothing is written unless every supplied
    /// field passes.
    pub async fn update(&self, number: &str, changes: ReleaseUpdate) -> StoreResult<Release> {
        check_presence(&changes, &["number", "client"])?;

        let documents = self.store.documents();
        let current = self
            .get(number)
            .await?
            .ok_or_else(|| gateway::not_found(COLLECTION, &key(number)))?;

        let mut set = Document::new();
        let mut unique = None;

        if let Some(new_number) = changes.number {
            if new_number != current.number {
                if documents.contains(COLLECTION, &key(&new_number)).await? {
                    return Err(gateway::conflict(COLLECTION));
                }
                unique = Some(key(&new_number));
            }
            set.insert("number".into(), Value::String(new_number));
        }

        if let Some(client) = changes.client {
            set.insert("client".into(), Value::String(client));
        }

        let quantity_20ft = changes
            .quantity_20ft
            .as_ref()
            .map(|q| check_quantity("20ft", q))
            .transpose()?;
        let quantity_40ft = changes
            .quantity_40ft
            .as_ref()
            .map(|q| check_quantity("40ft", q))
            .transpose()?;
        if quantity_20ft.is_some() || quantity_40ft.is_some() {
            let effective_20ft = quantity_20ft.unwrap_or(current.quantity_20ft);
            let effective_40ft = quantity_40ft.unwrap_or(current.quantity_40ft);
            if effective_20ft == 0 && effective_40ft == 0 {
                return Err(StoreError::ZeroQuantity);
            }
        }
        if let Some(quantity) = quantity_20ft {
            set.insert("quantity20ft".into(), Value::from(quantity));
        }
        if let Some(quantity) = quantity_40ft {
            set.insert("quantity40ft".into(), Value::from(quantity));
        }

        let acceptance_date = changes
            .acceptance_date
            .as_ref()
            .map(|date| resolve_date(Some(date)))
            .transpose()?;
        let cutoff_date = changes
            .cutoff_date
            .as_ref()
            .map(|date| resolve_date(Some(date)))
            .transpose()?;
        if acceptance_date.is_some() || cutoff_date.is_some() {
            check_date_order(
                acceptance_date.unwrap_or(current.acceptance_date),
                cutoff_date.unwrap_or(current.cutoff_date),
            )?;
        }
        if let Some(date) = acceptance_date {
            set.insert("acceptanceDate".into(), to_value(ENTITY, &date)?);
        }
        if let Some(date) = cutoff_date {
            set.insert("cutoffDate".into(), to_value(ENTITY, &date)?);
        }

        if changes.from.is_some() || changes.to.is_some() {
            let from = changes.from.as_deref().unwrap_or(&current.from);
            let to = changes.to.as_deref().unwrap_or(&current.to);
            if from == to {
                return Err(StoreError::IdenticalEndpoints);
            }
        }
        if let Some(from) = changes.from {
            self.check_location(&from).await?;
            set.insert("from".into(), Value::String(from));
        }
        if let Some(to) = changes.to {
            self.check_location(&to).await?;
            set.insert("to".into(), Value::String(to));
        }

        if set.is_empty() {
            return Ok(current);
        }

        let updated = match &unique {
            Some(unique) => {
                documents
                    .update_unique(COLLECTION, &key(number), unique, set)
                    .await?
            }
            None => documents.update(COLLECTION, &key(number), set).await?,
        };
        tracing::debug!(number = %number, "Updated release");
        from_document(ENTITY, updated)
    }

    pub async fn remove(&self, number: &str) -> StoreResult<Release> {
        let removed = self.store.documents().remove(COLLECTION, &key(number)).await?;
        tracing::debug!(number = %number, "Removed release");
        from_document(ENTITY, removed)
    }

    pub async fn get(&self, number: &str) -> StoreResult<Option<Release>> {
        self.store
            .documents()
            .get(COLLECTION, &key(number))
            .await?
            .map(|doc| from_document(ENTITY, doc))
            .transpose()
    }

    pub async fn get_all(&self) -> StoreResult<Vec<Release>> {
        self.store
            .documents()
            .get_all(COLLECTION)
            .await?
            .into_iter()
            .map(|doc| from_document(ENTITY, doc))
            .collect()
    }

    pub async fn contains(&self, number: &str) -> StoreResult<bool> {
        self.store.documents().contains(COLLECTION, &key(number)).await
    }

    /// Every release starting or ending at `location`
    pub async fn referencing(&self, location: &str) -> StoreResult<Vec<Release>> {
        self.store
            .documents()
            .find(COLLECTION, &references_location(location))
            .await?
            .into_iter()
            .map(|doc| from_document(ENTITY, doc))
            .collect()
    }

    /// Estimated minutes to drive a release from its source to its destination
    ///
    /// Resolves both location names to their addresses and asks the address
    /// service, which includes its delivery overhead in the answer.
    pub async fn travel_minutes(&self, number: &str, depart: DateTime<Utc>) -> StoreResult<u32> {
        let release = self
            .get(number)
            .await?
            .ok_or_else(|| gateway::not_found(COLLECTION, &key(number)))?;

        let locations = self.store.locations();
        let from = locations
            .get(&release.from)
            .await?
            .ok_or_else(|| StoreError::AddressNotFound(release.from.clone()))?;
        let to = locations
            .get(&release.to)
            .await?
            .ok_or_else(|| StoreError::AddressNotFound(release.to.clone()))?;

        self.store
            .addresses()
            .travel_minutes(&from.address, &to.address, depart)
            .await
    }
}
