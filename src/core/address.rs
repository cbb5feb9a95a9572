//! Address validation and travel-time estimation
//!
//! Locations must have an address the lookup service can resolve. The same
//! service estimates how long a truck takes between two addresses, including a
//! fixed overhead for loading and unloading.
//!
//! - [`StaticAddressBook`]: fixed address set and route table, for development and tests
//! - `DistanceMatrixClient` (feature `distance-matrix`): Google Distance Matrix API

use crate::core::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// External address service
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// `true` if the service can resolve `address`
    ///
    /// Transport failures count as "not resolvable".
    async fn is_valid_address(&self, address: &str) -> bool;

    /// Travel time in minutes from `source` to `destination` leaving at `depart`
    async fn travel_minutes(
        &self,
        source: &str,
        destination: &str,
        depart: DateTime<Utc>,
    ) -> StoreResult<u32>;
}

/// Parse provider duration text such as "45 mins" or "1 hour 5 mins"
///
/// Returns `None` for any other shape and for totals that overflow `u32`.
pub fn parse_duration_text(text: &str) -> Option<u32> {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        [amount, unit] => {
            let amount: u32 = amount.parse().ok()?;
            if unit.starts_with("hour") {
                amount.checked_mul(60)
            } else if unit.starts_with("min") {
                Some(amount)
            } else {
                None
            }
        }
        [hours, hour_unit, minutes, minute_unit]
            if hour_unit.starts_with("hour") && minute_unit.starts_with("min") =>
        {
            let hours: u32 = hours.parse().ok()?;
            let minutes: u32 = minutes.parse().ok()?;
            hours.checked_mul(60)?.checked_add(minutes)
        }
        _ => None,
    }
}

/// Add the delivery overhead to a route duration
fn with_overhead(minutes: u32, overhead_minutes: u32) -> StoreResult<u32> {
    minutes.checked_add(overhead_minutes).ok_or_else(|| {
        StoreError::Lookup(format!(
            "travel time of {} minutes plus {} minutes overhead is out of range",
            minutes, overhead_minutes
        ))
    })
}

/// Address book backed by a fixed set of known addresses
#[derive(Debug, Clone, Default)]
pub struct StaticAddressBook {
    addresses: HashSet<String>,
    routes: HashMap<(String, String), u32>,
    overhead_minutes: u32,
}

impl StaticAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.addresses.insert(address.to_string());
        self
    }

    /// Register a route duration (without overhead); both ends become known addresses
    pub fn with_route(mut self, source: &str, destination: &str, minutes: u32) -> Self {
        self.addresses.insert(source.to_string());
        self.addresses.insert(destination.to_string());
        self.routes
            .insert((source.to_string(), destination.to_string()), minutes);
        self
    }

    pub fn with_overhead(mut self, minutes: u32) -> Self {
        self.overhead_minutes = minutes;
        self
    }
}

#[async_trait]
impl AddressLookup for StaticAddressBook {
    async fn is_valid_address(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    async fn travel_minutes(
        &self,
        source: &str,
        destination: &str,
        _depart: DateTime<Utc>,
    ) -> StoreResult<u32> {
        let minutes = self
            .routes
            .get(&(source.to_string(), destination.to_string()))
            .ok_or_else(|| {
                StoreError::Lookup(format!("no route from '{}' to '{}'", source, destination))
            })?;
        with_overhead(*minutes, self.overhead_minutes)
    }
}

#[cfg(feature = "distance-matrix")]
pub use distance_matrix::DistanceMatrixClient;

#[cfg(feature = "distance-matrix")]
mod distance_matrix {
    use super::{AddressLookup, parse_duration_text, with_overhead};
    use crate::config::AddressLookupConfig;
    use crate::core::error::{StoreError, StoreResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct MatrixResponse {
        #[serde(default)]
        rows: Vec<MatrixRow>,
    }

    #[derive(Debug, Deserialize)]
    struct MatrixRow {
        #[serde(default)]
        elements: Vec<MatrixElement>,
    }

    #[derive(Debug, Deserialize)]
    struct MatrixElement {
        status: String,
        duration: Option<MatrixText>,
    }

    #[derive(Debug, Deserialize)]
    struct MatrixText {
        text: String,
    }

    impl MatrixResponse {
        fn first_element(&self) -> Option<&MatrixElement> {
            self.rows.first()?.elements.first()
        }
    }

    /// Address lookup backed by the Google Distance Matrix API
    #[derive(Debug, Clone)]
    pub struct DistanceMatrixClient {
        http: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        overhead_minutes: u32,
    }

    impl DistanceMatrixClient {
        pub fn new(config: &AddressLookupConfig) -> Self {
            Self {
                http: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
                overhead_minutes: config.travel_overhead_minutes,
            }
        }

        async fn query(
            &self,
            origin: &str,
            destination: &str,
            depart: Option<DateTime<Utc>>,
        ) -> Result<MatrixResponse, reqwest::Error> {
            let mut params = vec![
                ("origins", origin.to_string()),
                ("destinations", destination.to_string()),
            ];
            if let Some(depart) = depart {
                params.push(("departure_time", depart.timestamp().to_string()));
            }
            if let Some(key) = &self.api_key {
                params.push(("key", key.clone()));
            }

            self.http
                .get(&self.endpoint)
                .query(&params)
                .send()
                .await?
                .error_for_status()?
                .json::<MatrixResponse>()
                .await
        }
    }

    #[async_trait]
    impl AddressLookup for DistanceMatrixClient {
        async fn is_valid_address(&self, address: &str) -> bool {
            match self.query(address, address, None).await {
                Ok(response) => response
                    .first_element()
                    .is_some_and(|element| element.status != "NOT_FOUND"),
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Address lookup failed, treating address as invalid");
                    false
                }
            }
        }

        async fn travel_minutes(
            &self,
            source: &str,
            destination: &str,
            depart: DateTime<Utc>,
        ) -> StoreResult<u32> {
            let response = self
                .query(source, destination, Some(depart))
                .await
                .map_err(|e| StoreError::Lookup(e.to_string()))?;

            let text = response
                .first_element()
                .and_then(|element| element.duration.as_ref())
                .map(|duration| duration.text.as_str())
                .ok_or_else(|| {
                    StoreError::Lookup(format!(
                        "no duration from '{}' to '{}'",
                        source, destination
                    ))
                })?;

            let minutes = parse_duration_text(text)
                .ok_or_else(|| StoreError::Lookup(format!("'{}' is invalid", text)))?;

            with_overhead(minutes, self.overhead_minutes)
        }
    }
}
