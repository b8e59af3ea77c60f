//! Result types shared by rule collection backends.

use bson::{Bson, Document};
use futures_util::stream::BoxStream;

use crate::error::StorageError;

/// Pull-based sequence of documents returned by a find.
///
/// Dropping the stream abandons the iteration without touching the store.
pub type DocumentStream = BoxStream<'static, Result<Document, StorageError>>;

/// Outcome of a single-document insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    /// Identity the store assigned to the document.
    pub inserted_id: Bson,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    /// Identities the store assigned, in input order.
    pub inserted_ids: Vec<Bson>,
}

impl InsertManyResult {
    /// Number of documents inserted.
    #[must_use]
    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// Number of documents removed.
    pub deleted_count: u64,
}

impl DeleteResult {
    #[must_use]
    pub fn new(deleted_count: u64) -> Self {
        Self { deleted_count }
    }

    /// Returns `true` if at least one document was removed.
    #[must_use]
    pub fn any_deleted(&self) -> bool {
        self.deleted_count > 0
    }
}
