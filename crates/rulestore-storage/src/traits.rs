//! The rule collection trait.
//!
//! This is the document-store collaborator of the adapter: a single
//! collection supporting filtered finds, inserts and filtered deletes.
//! Queries are MongoDB-style filter documents.

use async_trait::async_trait;
use bson::Document;

use crate::error::StorageError;
use crate::types::{DeleteResult, DocumentStream, InsertManyResult, InsertOneResult};

/// A document collection that stores policy rules.
///
/// Implementations must be thread-safe (`Send + Sync`); the adapter shares one
/// handle across all of its operations and never locks around it.
///
/// # Example
///
/// ```ignore
/// use futures_util::TryStreamExt;
/// use rulestore_storage::{RuleCollection, StorageError};
///
/// async fn count_rules(collection: &dyn RuleCollection) -> Result<usize, StorageError> {
///     let docs: Vec<_> = collection.find(bson::doc! {}).await?.try_collect().await?;
///     Ok(docs.len())
/// }
/// ```
#[async_trait]
pub trait RuleCollection: Send + Sync {
    /// Returns the documents matching `filter`, in store order.
    ///
    /// An empty filter matches every document.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be executed. Errors met while
    /// iterating are yielded by the stream.
    async fn find(&self, filter: Document) -> Result<DocumentStream, StorageError>;

    /// Inserts one document. The store assigns `_id` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the insert.
    async fn insert_one(&self, document: Document) -> Result<InsertOneResult, StorageError>;

    /// Inserts a batch of documents in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the batch. Documents inserted
    /// before the failure stay committed.
    async fn insert_many(&self, documents: Vec<Document>)
    -> Result<InsertManyResult, StorageError>;

    /// Deletes every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    async fn delete_many(&self, filter: Document) -> Result<DeleteResult, StorageError>;
}

#[async_trait]
impl<T: RuleCollection + ?Sized> RuleCollection for std::sync::Arc<T> {
    async fn find(&self, filter: Document) -> Result<DocumentStream, StorageError> {
        (**self).find(filter).await
    }

    async fn insert_one(&self, document: Document) -> Result<InsertOneResult, StorageError> {
        (**self).insert_one(document).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
    ) -> Result<InsertManyResult, StorageError> {
        (**self).insert_many(documents).await
    }

    async fn delete_many(&self, filter: Document) -> Result<DeleteResult, StorageError> {
        (**self).delete_many(filter).await
    }
}
