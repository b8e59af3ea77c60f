//! # rulestore-adapter
//!
//! Persists Casbin policy rules in a document store.
//!
//! [`RuleStoreAdapter`] implements [`casbin::Adapter`] on top of any
//! [`RuleCollection`](rulestore_storage::RuleCollection): the MongoDB backend
//! in production, the in-memory backend in tests. An enforcer loads stored
//! rules through it and its auto-save applies incremental adds and removes
//! straight to the store.
//!
//! # Example
//!
//! ```ignore
//! use casbin::{CoreApi, DefaultModel, Enforcer, MgmtApi};
//! use rulestore_adapter::RuleStoreAdapter;
//! use rulestore_db_memory::InMemoryCollection;
//!
//! let model = DefaultModel::from_file("rbac_model.conf").await?;
//! let adapter = RuleStoreAdapter::new(InMemoryCollection::new());
//! let mut enforcer = Enforcer::new(model, adapter).await?;
//!
//! enforcer.add_policy(vec!["alice".into(), "data1".into(), "read".into()]).await?;
//! assert!(enforcer.enforce(("alice", "data1", "read"))?);
//! ```

pub mod adapter;
pub mod query;

pub use adapter::{RuleStoreAdapter, SAVED_SECTIONS};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapter::RuleStoreAdapter;
    pub use casbin::{Adapter, DefaultModel, Filter, Model};
    pub use rulestore_core::{CasbinRule, RuleFilter};
    pub use rulestore_storage::{StorageError, StorageResult};
}
