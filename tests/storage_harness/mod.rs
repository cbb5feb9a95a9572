//! Shared test harness for storage backend and entity testing
//!
//! Provides document fixtures, an address book that knows every test address,
//! entity input fixtures for the standard location/release scenario, and the
//! `document_store_tests!` contract suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
mod document_store_tests;

use recur::prelude::*;
use serde_json::Value;
use std::sync::Arc;

pub const PLACE_ADDRESS: &str = "55 Wellesley St E, Auckland";
pub const ELSEWHERE_ADDRESS: &str = "1 Quay St, Auckland";
pub const DEPOT_ADDRESS: &str = "20 Fanshawe St, Auckland";

/// Route time between the two scenario addresses, before overhead
pub const ROUTE_MINUTES: u32 = 25;

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a gateway document from a JSON object literal
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {}", other),
    }
}

/// Address book knowing every test address, with a 30-minute overhead
pub fn address_book() -> StaticAddressBook {
    StaticAddressBook::new()
        .with_route(PLACE_ADDRESS, ELSEWHERE_ADDRESS, ROUTE_MINUTES)
        .with_address(DEPOT_ADDRESS)
        .with_overhead(30)
}

/// Entity store over `documents` using [`address_book`]
pub fn entity_store(documents: Arc<dyn DocumentStore>) -> EntityStore {
    init_tracing();
    EntityStore::new(documents, Arc::new(address_book()))
}

/// Scenario location "Place"
pub fn place() -> NewLocation {
    NewLocation::new("Place", PLACE_ADDRESS)
        .with_type("Port")
        .with_hours("06:30", "20:00")
        .with_booking(true)
}

/// Scenario location "Somewhere else"
pub fn somewhere_else() -> NewLocation {
    NewLocation::new("Somewhere else", ELSEWHERE_ADDRESS).with_hours("07:00", "17:00")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Release 123456 from "Place" to "Somewhere else"
pub fn release_123456() -> NewRelease {
    NewRelease::new("123456", "abc inc.")
        .with_quantities(15, 0)
        .with_dates(date(2018, 2, 1), date(2018, 3, 15))
        .between("Place", "Somewhere else")
}

/// Insert both scenario locations
pub async fn seed_locations(store: &EntityStore) {
    store.locations().insert(place()).await.unwrap();
    store.locations().insert(somewhere_else()).await.unwrap();
}
