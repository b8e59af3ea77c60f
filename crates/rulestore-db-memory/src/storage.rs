use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use futures_util::StreamExt;
use futures_util::stream;
use rulestore_storage::{
    DeleteResult, DocumentStream, InsertManyResult, InsertOneResult, RuleCollection,
    StorageError, StorageResult,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::matches;

const ID_FIELD: &str = "_id";

/// In-memory rule collection.
///
/// Documents are kept in insertion order, which is also the order finds
/// return them in. Missing `_id` fields are filled with a fresh [`ObjectId`],
/// placed first like the MongoDB server does.
#[derive(Debug, Default)]
pub struct InMemoryCollection {
    documents: RwLock<Vec<Document>>,
}

impl InMemoryCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding `documents` as-is, without assigning ids.
    ///
    /// Useful for seeding documents a well-behaved writer would never produce.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Copy of every stored document, in store order.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }

    fn with_id(document: Document) -> (Bson, Document) {
        if let Some(id) = document.get(ID_FIELD) {
            return (id.clone(), document);
        }
        let id = Bson::ObjectId(ObjectId::new());
        let mut stored = Document::new();
        stored.insert(ID_FIELD, id.clone());
        for (key, value) in document {
            stored.insert(key, value);
        }
        (id, stored)
    }

    fn check_unique(documents: &[Document], id: &Bson) -> StorageResult<()> {
        if documents.iter().any(|doc| doc.get(ID_FIELD) == Some(id)) {
            return Err(StorageError::backend(DuplicateKey(id.to_string())));
        }
        Ok(())
    }
}

/// Insert of a document whose `_id` is already taken.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key: _id {0}")]
pub struct DuplicateKey(pub String);

#[async_trait]
impl RuleCollection for InMemoryCollection {
    async fn find(&self, filter: Document) -> StorageResult<DocumentStream> {
        debug!(?filter, "in-memory find");
        let guard = self.documents.read().await;
        let mut found = Vec::new();
        for doc in guard.iter() {
            if matches(doc, &filter)? {
                found.push(doc.clone());
            }
        }
        Ok(stream::iter(found.into_iter().map(Ok::<_, StorageError>)).boxed())
    }

    async fn insert_one(&self, document: Document) -> StorageResult<InsertOneResult> {
        let (inserted_id, stored) = Self::with_id(document);
        let mut guard = self.documents.write().await;
        Self::check_unique(&guard, &inserted_id)?;
        guard.push(stored);
        Ok(InsertOneResult { inserted_id })
    }

    async fn insert_many(&self, documents: Vec<Document>) -> StorageResult<InsertManyResult> {
        let mut guard = self.documents.write().await;
        let mut inserted_ids = Vec::with_capacity(documents.len());
        // Ordered semantics: documents before a failing one stay inserted.
        for document in documents {
            let (id, stored) = Self::with_id(document);
            Self::check_unique(&guard, &id)?;
            guard.push(stored);
            inserted_ids.push(id);
        }
        Ok(InsertManyResult { inserted_ids })
    }

    async fn delete_many(&self, filter: Document) -> StorageResult<DeleteResult> {
        debug!(?filter, "in-memory delete_many");
        let mut guard = self.documents.write().await;
        let mut keep = Vec::with_capacity(guard.len());
        for doc in guard.iter() {
            keep.push(!matches(doc, &filter)?);
        }
        let before = guard.len();
        let mut flags = keep.into_iter();
        guard.retain(|_| flags.next().unwrap_or(true));
        Ok(DeleteResult::new((before - guard.len()) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use futures_util::TryStreamExt;

    async fn collect(collection: &InMemoryCollection, filter: Document) -> Vec<Document> {
        collection
            .find(filter)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_object_id_first() {
        let collection = InMemoryCollection::new();
        let result = collection
            .insert_one(doc! { "ptype": "p", "v0": "alice" })
            .await
            .unwrap();
        assert!(matches!(result.inserted_id, Bson::ObjectId(_)));

        let stored = collection.snapshot().await;
        let keys: Vec<&String> = stored[0].keys().collect();
        assert_eq!(keys, ["_id", "ptype", "v0"]);
        assert_eq!(stored[0].get("_id"), Some(&result.inserted_id));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let collection = InMemoryCollection::new();
        collection.insert_one(doc! { "_id": 1, "ptype": "p" }).await.unwrap();
        let err = collection
            .insert_one(doc! { "_id": 1, "ptype": "g" })
            .await
            .unwrap_err();
        assert!(err.is_backend());
        assert!(err.backend_source().unwrap().downcast_ref::<DuplicateKey>().is_some());
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let collection = InMemoryCollection::new();
        for user in ["carol", "alice", "bob"] {
            collection
                .insert_one(doc! { "ptype": "p", "v0": user })
                .await
                .unwrap();
        }
        let users: Vec<String> = collect(&collection, doc! {})
            .await
            .iter()
            .map(|doc| doc.get_str("v0").unwrap().to_string())
            .collect();
        assert_eq!(users, ["carol", "alice", "bob"]);
    }

    #[tokio::test]
    async fn test_delete_many_counts() {
        let collection = InMemoryCollection::new();
        collection
            .insert_many(vec![
                doc! { "ptype": "p", "v0": "alice", "v1": "data1" },
                doc! { "ptype": "p", "v0": "bob", "v1": "data1" },
                doc! { "ptype": "g", "v0": "alice", "v1": "admin" },
            ])
            .await
            .unwrap();

        let result = collection
            .delete_many(doc! { "ptype": "p", "v1": "data1" })
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 2);
        assert_eq!(collection.len().await, 1);

        let result = collection.delete_many(doc! { "ptype": "p" }).await.unwrap();
        assert_eq!(result, DeleteResult::new(0));
    }

    #[tokio::test]
    async fn test_invalid_query_leaves_documents_untouched() {
        let collection = InMemoryCollection::new();
        collection.insert_one(doc! { "ptype": "p" }).await.unwrap();
        let err = collection
            .delete_many(doc! { "ptype": { "$regex": "p" } })
            .await
            .unwrap_err();
        assert!(err.is_invalid_query());
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_with_documents_keeps_raw_shape() {
        let collection = InMemoryCollection::with_documents(vec![doc! { "v0": "orphan" }]);
        let docs = collect(&collection, doc! {}).await;
        assert_eq!(docs, [doc! { "v0": "orphan" }]);
    }
}
