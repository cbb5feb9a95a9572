//! In-memory implementation of DocumentStore for testing and development

use crate::core::error::StoreResult;
use crate::core::gateway::{self, DocumentStore, Reference, Removal};
use crate::core::query::{Document, Filter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const BACKEND: &str = "in-memory";

/// In-memory document store
///
/// Collections keep documents in insertion order. Every conditional write runs
/// under a single write lock, so uniqueness and dependency checks cannot race
/// with other writers.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl InMemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn position(docs: &[Document], filter: &Filter) -> Option<usize> {
    docs.iter().position(|doc| filter.matches(doc))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        collection: &str,
        unique: Option<&Filter>,
        document: Document,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(unique) = unique
            && position(docs, unique).is_some()
        {
            tracing::debug!(collection, filter = %unique, "Rejected duplicate insert");
            return Err(gateway::conflict(collection));
        }

        docs.push(document.clone());
        tracing::debug!(collection, "Inserted document");
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        changes: Document,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| filter.matches(doc)))
            .ok_or_else(|| gateway::not_found(collection, filter))?;

        for (field, value) in changes {
            doc.insert(field, value);
        }
        tracing::debug!(collection, filter = %filter, "Updated document");
        Ok(doc.clone())
    }

    async fn update_unique(
        &self,
        collection: &str,
        filter: &Filter,
        unique: &Filter,
        changes: Document,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| gateway::not_found(collection, filter))?;
        let index = position(docs, filter).ok_or_else(|| gateway::not_found(collection, filter))?;

        let clash = docs
            .iter()
            .enumerate()
            .any(|(i, doc)| i != index && unique.matches(doc));
        if clash {
            tracing::debug!(collection, filter = %unique, "Rejected duplicate update");
            return Err(gateway::conflict(collection));
        }

        let doc = &mut docs[index];
        for (field, value) in changes {
            doc.insert(field, value);
        }
        tracing::debug!(collection, filter = %filter, "Updated document");
        Ok(doc.clone())
    }

    async fn upsert(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        match position(docs, filter) {
            Some(index) => docs[index] = document.clone(),
            None => docs.push(document.clone()),
        }
        tracing::debug!(collection, filter = %filter, "Upserted document");
        Ok(document)
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| gateway::not_found(collection, filter))?;
        let index = position(docs, filter).ok_or_else(|| gateway::not_found(collection, filter))?;

        tracing::debug!(collection, filter = %filter, "Removed document");
        Ok(docs.remove(index))
    }

    async fn remove_unless_referenced(
        &self,
        collection: &str,
        filter: &Filter,
        reference: &Reference<'_>,
    ) -> StoreResult<Removal> {
        let mut collections = self.collections.write().await;

        let blocker = collections.get(reference.collection).and_then(|docs| {
            docs.iter()
                .find(|doc| reference.filter.matches(doc))
                .cloned()
        });
        if let Some(blocker) = blocker {
            return Ok(Removal::Blocked(blocker));
        }

        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| gateway::not_found(collection, filter))?;
        let index = position(docs, filter).ok_or_else(|| gateway::not_found(collection, filter))?;

        tracing::debug!(collection, filter = %filter, "Removed unreferenced document");
        Ok(Removal::Removed(docs.remove(index)))
    }
}
