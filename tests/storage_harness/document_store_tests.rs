//! Macro-generated test suite for `DocumentStore` contract validation.
//!
//! The `document_store_tests!` macro generates a test module that validates any
//! `DocumentStore` implementation against the gateway contract: get, get_all,
//! contains, guarded insert, merge update, upsert, remove and guarded removal.
//! It closes with a few entity-level flows run on top of the backend.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use recur::storage::InMemoryStore;
//!
//! document_store_tests!(InMemoryStore::new());
//! ```

/// Generate a full `DocumentStore` conformance test suite.
///
/// `$factory` must be an expression that evaluates to a fresh, empty store
/// implementing `DocumentStore + 'static`. It is re-evaluated for each test.
#[macro_export]
macro_rules! document_store_tests {
    ($factory:expr) => {
        mod document_store_contract_tests {
            use super::*;
            use recur::prelude::*;
            use serde_json::{Value, json};
            use std::sync::Arc;

            // ==================================================================
            // get / contains
            // ==================================================================

            #[tokio::test]
            async fn test_get_nonexistent_is_none() {
                let store = $factory;

                let found = store
                    .get("trucks", &Filter::eq("name", "ghost"))
                    .await
                    .unwrap();
                assert!(found.is_none(), "Missing document must be None");
                assert!(!store.contains("trucks", &Filter::eq("name", "ghost")).await.unwrap());
            }

            #[tokio::test]
            async fn test_insert_then_get_round_trips() {
                let store = $factory;
                let truck = doc(json!({"name": "T1", "type": "Tribox"}));

                let inserted = store.insert("trucks", None, truck.clone()).await.unwrap();
                assert_eq!(inserted, truck);

                let fetched = store
                    .get("trucks", &Filter::eq("name", "T1"))
                    .await
                    .unwrap()
                    .expect("Inserted document should exist");
                assert_eq!(fetched, truck, "No storage id may leak into documents");
                assert!(store.contains("trucks", &Filter::eq("name", "T1")).await.unwrap());
            }

            // ==================================================================
            // get_all / find
            // ==================================================================

            #[tokio::test]
            async fn test_get_all_empty_and_ordered() {
                let store = $factory;
                assert!(store.get_all("trucks").await.unwrap().is_empty());

                for name in ["T3", "T1", "T2"] {
                    store
                        .insert("trucks", None, doc(json!({"name": name})))
                        .await
                        .unwrap();
                }

                let names: Vec<Value> = store
                    .get_all("trucks")
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|d| d["name"].clone())
                    .collect();
                assert_eq!(names, vec![json!("T3"), json!("T1"), json!("T2")]);
            }

            #[tokio::test]
            async fn test_find_with_or_filter() {
                let store = $factory;
                for (number, from, to) in [("1", "A", "B"), ("2", "B", "C"), ("3", "C", "D")] {
                    store
                        .insert(
                            "releases",
                            None,
                            doc(json!({"number": number, "from": from, "to": to})),
                        )
                        .await
                        .unwrap();
                }

                let touching_b = store
                    .find(
                        "releases",
                        &Filter::eq("from", "B").or(Filter::eq("to", "B")),
                    )
                    .await
                    .unwrap();
                assert_eq!(touching_b.len(), 2);

                let not_first = store
                    .find(
                        "releases",
                        &Filter::eq("from", "B").and(Filter::ne("number", "2")),
                    )
                    .await
                    .unwrap();
                assert!(not_first.is_empty());
            }

            // ==================================================================
            // insert uniqueness
            // ==================================================================

            #[tokio::test]
            async fn test_unique_insert_conflicts() {
                let store = $factory;
                let unique = Filter::eq("name", "T1");
                store
                    .insert("trucks", Some(&unique), doc(json!({"name": "T1"})))
                    .await
                    .unwrap();

                let err = store
                    .insert("trucks", Some(&unique), doc(json!({"name": "T1"})))
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "CONFLICT");

                let matching = store.find("trucks", &unique).await.unwrap();
                assert_eq!(matching.len(), 1, "Duplicate must not be stored");
            }

            // ==================================================================
            // update
            // ==================================================================

            #[tokio::test]
            async fn test_update_merges_fields() {
                let store = $factory;
                store
                    .insert(
                        "releases",
                        None,
                        doc(json!({"number": "1", "client": "abc", "quantity20ft": 3})),
                    )
                    .await
                    .unwrap();

                let updated = store
                    .update(
                        "releases",
                        &Filter::eq("number", "1"),
                        doc(json!({"client": "xyz"})),
                    )
                    .await
                    .unwrap();
                assert_eq!(
                    updated,
                    doc(json!({"number": "1", "client": "xyz", "quantity20ft": 3}))
                );
            }

            #[tokio::test]
            async fn test_update_nonexistent_is_not_found() {
                let store = $factory;
                let err = store
                    .update(
                        "releases",
                        &Filter::eq("number", "ghost"),
                        doc(json!({"client": "xyz"})),
                    )
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "NOT_FOUND");
            }

            #[tokio::test]
            async fn test_update_unique_rejects_clash_with_other_document() {
                let store = $factory;
                for name in ["T1", "T2"] {
                    store
                        .insert("trucks", None, doc(json!({"name": name, "type": "Tribox"})))
                        .await
                        .unwrap();
                }

                let err = store
                    .update_unique(
                        "trucks",
                        &Filter::eq("name", "T2"),
                        &Filter::eq("name", "T1"),
                        doc(json!({"name": "T1"})),
                    )
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "CONFLICT");

                let renamed = store
                    .update_unique(
                        "trucks",
                        &Filter::eq("name", "T2"),
                        &Filter::eq("name", "T3"),
                        doc(json!({"name": "T3"})),
                    )
                    .await
                    .unwrap();
                assert_eq!(renamed, doc(json!({"name": "T3", "type": "Tribox"})));

                let err = store
                    .update_unique(
                        "trucks",
                        &Filter::eq("name", "ghost"),
                        &Filter::eq("name", "T4"),
                        doc(json!({"name": "T4"})),
                    )
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "NOT_FOUND");
            }

            // ==================================================================
            // upsert
            // ==================================================================

            #[tokio::test]
            async fn test_upsert_inserts_then_replaces() {
                let store = $factory;
                let key = Filter::eq("id", "2018-02-01");

                store
                    .upsert("rounds", &key, doc(json!({"id": "2018-02-01", "dayRounds": [1]})))
                    .await
                    .unwrap();
                let replaced = store
                    .upsert("rounds", &key, doc(json!({"id": "2018-02-01", "nightRounds": [2]})))
                    .await
                    .unwrap();

                assert_eq!(replaced, doc(json!({"id": "2018-02-01", "nightRounds": [2]})));
                assert_eq!(store.get_all("rounds").await.unwrap().len(), 1);
            }

            // ==================================================================
            // remove
            // ==================================================================

            #[tokio::test]
            async fn test_remove_returns_previous_value() {
                let store = $factory;
                store
                    .insert("trucks", None, doc(json!({"name": "T1", "type": "Skeletal"})))
                    .await
                    .unwrap();

                let removed = store
                    .remove("trucks", &Filter::eq("name", "T1"))
                    .await
                    .unwrap();
                assert_eq!(removed, doc(json!({"name": "T1", "type": "Skeletal"})));
                assert!(store.get_all("trucks").await.unwrap().is_empty());

                let err = store
                    .remove("trucks", &Filter::eq("name", "T1"))
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "NOT_FOUND");
            }

            #[tokio::test]
            async fn test_remove_unless_referenced() {
                let store = $factory;
                store
                    .insert("locations", None, doc(json!({"name": "A"})))
                    .await
                    .unwrap();
                store
                    .insert("locations", None, doc(json!({"name": "B"})))
                    .await
                    .unwrap();
                store
                    .insert("releases", None, doc(json!({"number": "1", "from": "A", "to": "C"})))
                    .await
                    .unwrap();

                let reference = |name: &str| Reference {
                    collection: "releases",
                    filter: Filter::eq("from", name).or(Filter::eq("to", name)),
                };

                let blocked = store
                    .remove_unless_referenced("locations", &Filter::eq("name", "A"), &reference("A"))
                    .await
                    .unwrap();
                assert!(matches!(blocked, Removal::Blocked(ref d) if d["number"] == json!("1")));

                let removed = store
                    .remove_unless_referenced("locations", &Filter::eq("name", "B"), &reference("B"))
                    .await
                    .unwrap();
                assert_eq!(removed, Removal::Removed(doc(json!({"name": "B"}))));
                assert_eq!(store.get_all("locations").await.unwrap().len(), 1);
            }

            // ==================================================================
            // Entity flows on this backend
            // ==================================================================

            #[tokio::test]
            async fn test_entity_round_trip() {
                let entities = entity_store(Arc::new($factory));
                seed_locations(&entities).await;
                let release = entities.releases().insert(release_123456()).await.unwrap();

                let fetched = entities.releases().get("123456").await.unwrap();
                assert_eq!(fetched, Some(release));

                let location = entities.locations().get("Place").await.unwrap().unwrap();
                assert_eq!(location.location_type, LocationType::Port);
                assert_eq!(location.opening_time.to_string(), "06:30");
            }

            #[tokio::test]
            async fn test_entity_referenced_location_cannot_be_removed() {
                let entities = entity_store(Arc::new($factory));
                seed_locations(&entities).await;
                entities.releases().insert(release_123456()).await.unwrap();

                let err = entities.locations().remove("Place").await.unwrap_err();
                assert_eq!(err.error_code(), "DEPENDENCY_VIOLATION");

                entities.releases().remove("123456").await.unwrap();
                entities.locations().remove("Place").await.unwrap();
                assert_eq!(entities.locations().get_all().await.unwrap().len(), 1);
            }

            #[tokio::test]
            async fn test_entity_duplicate_location_conflicts() {
                let entities = entity_store(Arc::new($factory));
                entities.locations().insert(place()).await.unwrap();

                let err = entities
                    .locations()
                    .insert(NewLocation::new("Other", PLACE_ADDRESS).with_hours("08:00", "09:00"))
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "CONFLICT");
                assert_eq!(entities.locations().get_all().await.unwrap().len(), 1);
            }
        }
    };
}
