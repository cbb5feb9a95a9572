//! Decoding of partial-update bodies
//!
//! Inside the crate a partial update is a typed struct with one `Option` per
//! field, so an unknown field cannot be expressed. At the outer boundary the
//! body is still untyped JSON; [`Patch::from_json`] rejects unknown keys with
//! `InvalidProperty` before handing the object to serde.

use crate::core::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A typed partial update decodable from a JSON object
pub trait Patch: DeserializeOwned {
    /// Accepted JSON keys
    const FIELDS: &'static [&'static str];

    fn from_json(body: Value) -> StoreResult<Self> {
        let Value::Object(map) = body else {
            return Err(StoreError::InvalidBody(
                "expected a JSON object".to_string(),
            ));
        };

        if let Some(unknown) = map.keys().find(|key| !Self::FIELDS.contains(&key.as_str())) {
            return Err(StoreError::InvalidProperty(unknown.clone()));
        }

        Ok(serde_json::from_value(Value::Object(map))?)
    }
}
