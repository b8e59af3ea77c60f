//! In-memory rule collection backend for rulestore.
//!
//! This crate provides an in-memory implementation of the `RuleCollection`
//! trait from `rulestore-storage`. It evaluates the subset of MongoDB query
//! syntax the adapter emits, which makes it a stand-in for a live database in
//! tests and dry runs.
//!
//! # Example
//!
//! ```ignore
//! use rulestore_db_memory::InMemoryCollection;
//! use rulestore_storage::RuleCollection;
//!
//! let collection = InMemoryCollection::new();
//! collection.insert_one(bson::doc! { "ptype": "p", "v0": "alice" }).await?;
//! ```

pub mod query;
pub mod storage;

pub use rulestore_storage::{RuleCollection, StorageError};

pub use query::matches;
pub use storage::{DuplicateKey, InMemoryCollection};
