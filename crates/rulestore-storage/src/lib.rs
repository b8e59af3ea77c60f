//! # rulestore-storage
//!
//! Storage abstraction layer for rulestore.
//!
//! This crate defines the [`RuleCollection`] trait that every document-store
//! backend implements. It contains no implementations; those live in
//! `rulestore-db-memory` and `rulestore-db-mongo`.

mod error;
mod traits;
mod types;

pub use error::{BoxError, ErrorCategory, StorageError};
pub use traits::RuleCollection;
pub use types::{DeleteResult, DocumentStream, InsertManyResult, InsertOneResult};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::RuleCollection;
    pub use crate::types::{DeleteResult, DocumentStream, InsertManyResult, InsertOneResult};
    pub use crate::StorageResult;
}
