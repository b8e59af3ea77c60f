//! MongoDB storage backend for rulestore.
//!
//! Stores one policy rule per document in a single collection
//! (`casbin_rule` by default):
//!
//! ```text
//! { "_id": ObjectId(..), "ptype": "p", "v0": "alice", "v1": "data1", "v2": "read" }
//! ```
//!
//! Connection pooling, retries and timeouts are left to the driver and can be
//! tuned through the connection string.
//!
//! # Example
//!
//! ```ignore
//! use rulestore_db_mongo::{MongoConfig, MongoRuleCollection};
//!
//! let config = MongoConfig::new("mongodb://localhost:27017", "casbin");
//! let collection = MongoRuleCollection::connect(&config).await?;
//! ```

pub mod collection;
pub mod config;

pub use collection::MongoRuleCollection;
pub use config::{DEFAULT_COLLECTION, MongoConfig, mask_password};
