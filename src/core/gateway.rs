//! Persistence gateway trait
//!
//! [`DocumentStore`] is the only seam between the entity validators and the
//! underlying store. It works on named collections of [`Document`]s selected by
//! [`Filter`]s and never exposes storage-assigned identifiers.

use crate::core::error::{StoreError, StoreResult};
use crate::core::query::{Document, Filter};
use async_trait::async_trait;

/// Documents in another collection whose presence blocks a removal
#[derive(Debug, Clone)]
pub struct Reference<'a> {
    pub collection: &'a str,
    pub filter: Filter,
}

/// Outcome of a guarded removal
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// The document was deleted; this is its value just before deletion
    Removed(Document),
    /// Nothing was deleted; this is the first referencing document found
    Blocked(Document),
}

/// Storage operations over named document collections
///
/// Implementations must be safe to share between concurrent callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name used in storage errors and logs
    fn backend(&self) -> &'static str;

    /// Get the unique document matching `filter`
    async fn get(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Get every document matching `filter`
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Get every document in the collection
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.find(collection, &Filter::All).await
    }

    /// `true` if at least one document matches
    async fn contains(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
        Ok(self.get(collection, filter).await?.is_some())
    }

    /// Insert a document
    ///
    /// Fails with `Conflict` if `unique` is given and already matches a document.
    async fn insert(
        &self,
        collection: &str,
        unique: Option<&Filter>,
        document: Document,
    ) -> StoreResult<Document>;

    /// Merge `changes` into the document matching `filter`
    ///
    /// Fails with `NotFound` if nothing matches.
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        changes: Document,
    ) -> StoreResult<Document>;

    /// Merge `changes` into the document matching `filter` unless some other
    /// document matches `unique`
    ///
    /// Fails with `NotFound` if nothing matches `filter` and with `Conflict` if
    /// a document other than the target matches `unique`. The default body
    /// checks then writes in separate calls; backends that can hold one lock
    /// across both override it, and MongoDB relies on its unique indexes.
    async fn update_unique(
        &self,
        collection: &str,
        filter: &Filter,
        unique: &Filter,
        changes: Document,
    ) -> StoreResult<Document> {
        let target = self
            .get(collection, filter)
            .await?
            .ok_or_else(|| not_found(collection, filter))?;
        let clash = self
            .find(collection, unique)
            .await?
            .into_iter()
            .any(|doc| doc != target);
        if clash {
            return Err(conflict(collection));
        }
        self.update(collection, filter, changes).await
    }

    /// Replace the document matching `filter`, inserting it if absent
    async fn upsert(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<Document>;

    /// Delete the document matching `filter` and return it
    ///
    /// Fails with `NotFound` if nothing matches.
    async fn remove(&self, collection: &str, filter: &Filter) -> StoreResult<Document>;

    /// Delete the document matching `filter` unless `reference` matches anything
    ///
    /// The default body checks then deletes in two calls, so a referencing
    /// document written between them is not seen. Backends able to do both under
    /// one lock or transaction override it.
    async fn remove_unless_referenced(
        &self,
        collection: &str,
        filter: &Filter,
        reference: &Reference<'_>,
    ) -> StoreResult<Removal> {
        if let Some(blocker) = self.get(reference.collection, &reference.filter).await? {
            return Ok(Removal::Blocked(blocker));
        }
        self.remove(collection, filter).await.map(Removal::Removed)
    }
}

pub(crate) fn conflict(collection: &str) -> StoreError {
    StoreError::Conflict(format!("{} already contains entry", collection))
}

pub(crate) fn not_found(collection: &str, filter: &Filter) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        query: filter.to_string(),
    }
}
