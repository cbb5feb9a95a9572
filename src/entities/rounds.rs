//! Per-day truck schedules
//!
//! A [`TruckRounds`] document holds the day and night rounds for one date. It
//! is written with [`TruckRoundsService::upsert`], which inserts when the id is
//! new and otherwise replaces both round lists wholesale.

use crate::core::error::StoreResult;
use crate::core::query::Filter;
use crate::entities::{EntityStore, check_presence, from_document, to_document};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const COLLECTION: &str = "rounds";

const ENTITY: &str = "truck rounds";

/// One container position on a truck during a round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(rename = "supports40ft")]
    pub supports_40ft: bool,
    /// Number of the release assigned to this slot
    #[serde(default)]
    pub release: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_number: u32,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TruckRounds {
    #[validate(length(min = 1, message = "A rounds id must be supplied"))]
    pub id: String,
    #[serde(default)]
    pub day_rounds: Vec<Round>,
    #[serde(default)]
    pub night_rounds: Vec<Round>,
}

fn key(id: &str) -> Filter {
    Filter::eq("id", id)
}

pub struct TruckRoundsService<'a> {
    store: &'a EntityStore,
}

impl<'a> TruckRoundsService<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    /// Insert `entry`, or replace the rounds already stored under its id
    pub async fn upsert(&self, entry: TruckRounds) -> StoreResult<TruckRounds> {
        check_presence(&entry, &["id"])?;

        let stored = self
            .store
            .documents()
            .upsert(COLLECTION, &key(&entry.id), to_document(ENTITY, &entry)?)
            .await?;

        tracing::debug!(
            id = %entry.id,
            day_rounds = entry.day_rounds.len(),
            night_rounds = entry.night_rounds.len(),
            "Upserted truck rounds"
        );
        from_document(ENTITY, stored)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<TruckRounds>> {
        self.store
            .documents()
            .get(COLLECTION, &key(id))
            .await?
            .map(|doc| from_document(ENTITY, doc))
            .transpose()
    }

    pub async fn get_all(&self) -> StoreResult<Vec<TruckRounds>> {
        self.store
            .documents()
            .get_all(COLLECTION)
            .await?
            .into_iter()
            .map(|doc| from_document(ENTITY, doc))
            .collect()
    }

    pub async fn remove(&self, id: &str) -> StoreResult<TruckRounds> {
        let removed = self.store.documents().remove(COLLECTION, &key(id)).await?;
        tracing::debug!(id = %id, "Removed truck rounds");
        from_document(ENTITY, removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rounds_document_shape() {
        let rounds = TruckRounds {
            id: "2018-02-01".to_string(),
            day_rounds: vec![Round {
                round_number: 1,
                slots: vec![Slot {
                    supports_40ft: true,
                    release: Some("123456".to_string()),
                }],
            }],
            night_rounds: vec![],
        };

        assert_eq!(
            serde_json::to_value(&rounds).unwrap(),
            json!({
                "id": "2018-02-01",
                "dayRounds": [{
                    "roundNumber": 1,
                    "slots": [{"supports40ft": true, "release": "123456"}]
                }],
                "nightRounds": []
            })
        );
    }
}
