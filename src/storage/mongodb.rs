//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides [`MongoStore`], a [`DocumentStore`] backed by one long-lived
//! `mongodb::Database` handle. The driver pools connections internally, so a
//! failed operation never leaks one.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! recur-store = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! Each entity collection (`locations`, `releases`, ...) is a MongoDB
//! collection of the same name. MongoDB's `_id` is projected away on every
//! read so it never reaches an entity.
//!
//! Uniqueness is enforced by the unique indexes created in
//! [`MongoStore::ensure_indexes`]; a duplicate key error surfaces as
//! `StoreError::Conflict`. The pre-insert uniqueness query only gives a
//! friendlier early answer. Guarded removals use the gateway's
//! check-then-delete default, so a release written between the two calls is
//! not seen.

use crate::config::DatabaseConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::core::gateway::{self, DocumentStore};
use crate::core::query::{Document, Filter};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

const BACKEND: &str = "mongodb";

/// Unique keys per collection
const UNIQUE_INDEXES: &[(&str, &str)] = &[
    ("locations", "name"),
    ("locations", "address"),
    ("releases", "number"),
    ("trucks", "name"),
    ("users", "username"),
    ("rounds", "id"),
];

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn to_bson_document(document: &Document) -> StoreResult<bson::Document> {
    bson::to_document(document).map_err(|e| StoreError::storage(BACKEND, e))
}

/// Convert a BSON document back into a gateway document.
///
/// Relaxed extended JSON keeps numbers and strings in their plain JSON form.
fn from_bson_document(mut doc: bson::Document) -> Document {
    doc.remove("_id");
    match Bson::Document(doc).into_relaxed_extjson() {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn filter_to_bson(filter: &Filter) -> StoreResult<bson::Document> {
    let to_bson = |value: &serde_json::Value| {
        bson::to_bson(value).map_err(|e| StoreError::storage(BACKEND, e))
    };
    let group = |filters: &[Filter]| {
        filters
            .iter()
            .map(|f| filter_to_bson(f).map(Bson::Document))
            .collect::<StoreResult<Vec<_>>>()
    };

    Ok(match filter {
        Filter::All => doc! {},
        Filter::Eq(field, value) => doc! { field.as_str(): to_bson(value)? },
        Filter::Ne(field, value) => doc! { field.as_str(): { "$ne": to_bson(value)? } },
        Filter::And(filters) => doc! { "$and": group(filters)? },
        Filter::Or(filters) => doc! { "$or": group(filters)? },
    })
}

fn without_id() -> bson::Document {
    doc! { "_id": 0 }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::Command(e) => e.code == 11000,
        _ => false,
    }
}

fn write_error(collection: &str, err: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&err) {
        gateway::conflict(collection)
    } else {
        StoreError::storage(BACKEND, err)
    }
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// Document store backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use recur::storage::MongoStore;
///
/// let store = MongoStore::connect(&config.database).await?;
/// store.ensure_indexes().await?;
/// let entities = EntityStore::new(Arc::new(store), addresses);
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a new `MongoStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Open a client for `config.uri` and use the database `config.name`.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| StoreError::storage(BACKEND, e))?;
        tracing::info!(database = %config.name, "Connected to MongoDB");
        Ok(Self::new(client.database(&config.name)))
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Create the unique indexes every entity collection relies on.
    ///
    /// Safe to call repeatedly; existing identical indexes are left alone.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        for (collection, field) in UNIQUE_INDEXES {
            let index = IndexModel::builder()
                .keys(doc! { *field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection(collection)
                .create_index(index)
                .await
                .map_err(|e| StoreError::storage(BACKEND, e))?;
        }
        tracing::info!(count = UNIQUE_INDEXES.len(), "Ensured unique indexes");
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let doc = self
            .collection(collection)
            .find_one(filter_to_bson(filter)?)
            .projection(without_id())
            .await
            .map_err(|e| StoreError::storage(BACKEND, e))?;

        Ok(doc.map(from_bson_document))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(filter_to_bson(filter)?)
            .projection(without_id())
            .await
            .map_err(|e| StoreError::storage(BACKEND, e))?;

        let docs: Vec<bson::Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::storage(BACKEND, e))?;

        Ok(docs.into_iter().map(from_bson_document).collect())
    }

    async fn insert(
        &self,
        collection: &str,
        unique: Option<&Filter>,
        document: Document,
    ) -> StoreResult<Document> {
        if let Some(unique) = unique
            && self.contains(collection, unique).await?
        {
            return Err(gateway::conflict(collection));
        }

        self.collection(collection)
            .insert_one(to_bson_document(&document)?)
            .await
            .map_err(|e| write_error(collection, e))?;

        tracing::debug!(collection, "Inserted document");
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        changes: Document,
    ) -> StoreResult<Document> {
        let updated = self
            .collection(collection)
            .find_one_and_update(
                filter_to_bson(filter)?,
                doc! { "$set": to_bson_document(&changes)? },
            )
            .return_document(ReturnDocument::After)
            .projection(without_id())
            .await
            .map_err(|e| write_error(collection, e))?
            .ok_or_else(|| gateway::not_found(collection, filter))?;

        tracing::debug!(collection, filter = %filter, "Updated document");
        Ok(from_bson_document(updated))
    }

    async fn upsert(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<Document> {
        let stored = self
            .collection(collection)
            .find_one_and_replace(filter_to_bson(filter)?, to_bson_document(&document)?)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .projection(without_id())
            .await
            .map_err(|e| write_error(collection, e))?;

        tracing::debug!(collection, filter = %filter, "Upserted document");
        Ok(stored.map(from_bson_document).unwrap_or(document))
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> StoreResult<Document> {
        let removed = self
            .collection(collection)
            .find_one_and_delete(filter_to_bson(filter)?)
            .projection(without_id())
            .await
            .map_err(|e| StoreError::storage(BACKEND, e))?
            .ok_or_else(|| gateway::not_found(collection, filter))?;

        tracing::debug!(collection, filter = %filter, "Removed document");
        Ok(from_bson_document(removed))
    }
}
