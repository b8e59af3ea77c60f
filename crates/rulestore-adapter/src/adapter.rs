//! The document-store implementation of the policy engine's adapter contract.

use async_trait::async_trait;
use bson::{Document, doc};
use casbin::error::AdapterError;
use casbin::{Adapter, Filter, Model};
use futures_util::TryStreamExt;
use rulestore_core::{CasbinRule, ID_FIELD, RuleFilter};
use rulestore_storage::{RuleCollection, StorageError, StorageResult};
use tracing::{debug, info, instrument, warn};

use crate::query::{
    any_of, field_count, filter_query, filtered_removal_query, ids_query, positional_query,
    rule_query,
};

/// Sections the adapter persists on a full save.
pub const SAVED_SECTIONS: [&str; 2] = ["p", "g"];

/// Wraps a storage failure so the engine can surface it. Callers get the
/// [`StorageError`] back by downcasting the boxed source.
fn adapter_error(err: StorageError) -> casbin::Error {
    AdapterError(Box::new(err)).into()
}

/// Policy types the model defines under `sec`, sorted.
fn defined_ptypes(m: &dyn Model, sec: &str) -> Vec<String> {
    let mut ptypes: Vec<String> = m
        .get_model()
        .get(sec)
        .map(|assertions| assertions.keys().cloned().collect())
        .unwrap_or_default();
    ptypes.sort();
    ptypes
}

/// [`casbin::Adapter`] over any [`RuleCollection`].
///
/// Rules are stored one per document as `{ptype, v0, .., v5}` with unused
/// positions omitted. Every operation runs against the store immediately; the
/// engine's model is only touched by the load operations, and only additively.
#[derive(Debug)]
pub struct RuleStoreAdapter<C> {
    collection: C,
    is_filtered: bool,
}

impl<C: RuleCollection> RuleStoreAdapter<C> {
    pub fn new(collection: C) -> Self {
        Self {
            collection,
            is_filtered: false,
        }
    }

    /// Sets the initial value of the filtered flag.
    #[must_use]
    pub fn with_filtered(mut self, filtered: bool) -> Self {
        self.is_filtered = filtered;
        self
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Loads the rules selected by `filter` into `m` and marks the adapter as
    /// filtered.
    ///
    /// Unlike the positional engine filter this accepts a set of values per
    /// field, or a raw store query that is passed through unchanged.
    #[instrument(skip_all)]
    pub async fn load_filtered_rules(
        &mut self,
        m: &mut dyn Model,
        filter: &RuleFilter,
    ) -> StorageResult<()> {
        let query = filter_query(filter);
        debug!(?query, "Loading filtered policy");
        let loaded = self.load_matching(m, query).await?;
        self.is_filtered = true;
        info!(loaded, "Loaded filtered policy");
        Ok(())
    }

    /// Stored rules selected by `filter`, in store order.
    ///
    /// Nothing is merged, so duplicate documents and rules of every section
    /// are returned as stored.
    #[instrument(skip(self))]
    pub async fn find_rules(&self, filter: &RuleFilter) -> StorageResult<Vec<CasbinRule>> {
        let mut stream = self.collection.find(filter_query(filter)).await?;

        let mut rules = Vec::new();
        while let Some(doc) = stream.try_next().await? {
            if let Some(rule) = CasbinRule::from_document(&doc)? {
                rules.push(rule);
            }
        }
        debug!(found = rules.len(), "Found policy rules");
        Ok(rules)
    }

    /// Deletes every stored rule and returns how many documents went.
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> StorageResult<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        info!(deleted = result.deleted_count, "Cleared policy");
        Ok(result.deleted_count)
    }

    async fn load_matching(&self, m: &mut dyn Model, query: Document) -> StorageResult<usize> {
        let mut stream = self.collection.find(query).await?;

        let mut loaded = 0;
        while let Some(doc) = stream.try_next().await? {
            let Some(rule) = CasbinRule::from_document(&doc)? else {
                warn!(id = ?doc.get(ID_FIELD), "Skipping document without ptype");
                continue;
            };
            if rule.is_degenerate() {
                warn!(id = ?doc.get(ID_FIELD), ptype = %rule.ptype, "Skipping rule without values");
                continue;
            }
            let Some(sec) = rule.section() else {
                warn!(id = ?doc.get(ID_FIELD), "Skipping rule with empty ptype");
                continue;
            };
            let values = rule.values().into_iter().map(String::from).collect();
            if m.add_policy(sec, &rule.ptype, values) {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    async fn insert_rule(&self, ptype: &str, rule: &[String]) -> StorageResult<()> {
        let document = rule_query(ptype, rule)?;
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn insert_rules(&self, ptype: &str, rules: &[Vec<String>]) -> StorageResult<()> {
        let documents = rules
            .iter()
            .map(|rule| rule_query(ptype, rule))
            .collect::<Result<Vec<_>, _>>()?;
        if documents.is_empty() {
            return Ok(());
        }
        let result = self.collection.insert_many(documents).await?;
        debug!(inserted = result.inserted_count(), "Added policy rules");
        Ok(())
    }

    /// Deletes documents whose stored fields are exactly `ptype` plus `rule`.
    async fn delete_exact(&self, ptype: &str, rule: &[String]) -> StorageResult<u64> {
        let query = rule_query(ptype, rule)?;
        let expected = query.len();
        let mut stream = self.collection.find(query).await?;

        let mut ids = Vec::new();
        while let Some(doc) = stream.try_next().await? {
            if field_count(&doc) != expected {
                continue;
            }
            if let Some(id) = doc.get(ID_FIELD) {
                ids.push(id.clone());
            }
        }
        drop(stream);

        if ids.is_empty() {
            return Ok(0);
        }
        let result = self.collection.delete_many(ids_query(ids)).await?;
        Ok(result.deleted_count)
    }

    /// Returns `None` when the position range is out of bounds; such calls
    /// never reach the store.
    async fn delete_filtered(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> StorageResult<Option<u64>> {
        let Some(query) = filtered_removal_query(ptype, field_index, field_values) else {
            return Ok(None);
        };
        let result = self.collection.delete_many(query).await?;
        Ok(Some(result.deleted_count))
    }
}

#[async_trait]
impl<C: RuleCollection> Adapter for RuleStoreAdapter<C> {
    #[instrument(skip_all)]
    async fn load_policy(&mut self, m: &mut dyn Model) -> casbin::Result<()> {
        let loaded = self
            .load_matching(m, Document::new())
            .await
            .map_err(adapter_error)?;
        info!(loaded, "Loaded policy");
        Ok(())
    }

    /// Loads the rules matching the engine's positional filter.
    ///
    /// `f.p` constrains the `p` section and `f.g` the `g` section, position by
    /// position from `v0`; an empty string leaves a position open. Only
    /// policy types the model defines are read.
    #[instrument(skip_all)]
    async fn load_filtered_policy<'a>(
        &mut self,
        m: &mut dyn Model,
        f: Filter<'a>,
    ) -> casbin::Result<()> {
        let mut branches = Vec::new();
        for (sec, values) in [("p", &f.p), ("g", &f.g)] {
            let ptypes = defined_ptypes(m, sec);
            if !ptypes.is_empty() {
                branches.push(positional_query(&ptypes, values));
            }
        }

        let loaded = match any_of(branches) {
            Some(query) => {
                debug!(?query, "Loading filtered policy");
                self.load_matching(m, query).await.map_err(adapter_error)?
            }
            None => 0,
        };
        self.is_filtered = true;
        info!(loaded, "Loaded filtered policy");
        Ok(())
    }

    /// Appends every `p` and `g` section rule of `m` to the store.
    ///
    /// Existing documents are left in place. Rules are inserted one at a time
    /// and a store failure midway does not roll back earlier inserts.
    #[instrument(skip_all)]
    async fn save_policy(&mut self, m: &mut dyn Model) -> casbin::Result<()> {
        let mut rules = Vec::new();
        for sec in SAVED_SECTIONS {
            for ptype in defined_ptypes(m, sec) {
                for rule in m.get_policy(sec, &ptype) {
                    rules.push((ptype.clone(), rule));
                }
            }
        }

        for (ptype, rule) in &rules {
            self.insert_rule(ptype, rule).await.map_err(adapter_error)?;
        }
        info!(saved = rules.len(), "Saved policy");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_policy(&mut self) -> casbin::Result<()> {
        self.delete_all().await.map_err(adapter_error)?;
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        self.is_filtered
    }

    #[instrument(skip(self))]
    async fn add_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        rule: Vec<String>,
    ) -> casbin::Result<bool> {
        self.insert_rule(ptype, &rule).await.map_err(adapter_error)?;
        Ok(true)
    }

    #[instrument(skip(self, rules), fields(count = rules.len()))]
    async fn add_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        rules: Vec<Vec<String>>,
    ) -> casbin::Result<bool> {
        self.insert_rules(ptype, &rules)
            .await
            .map_err(adapter_error)?;
        Ok(true)
    }

    /// Deletes the documents holding exactly `rule`: a stored rule with more
    /// values than `rule` is not a match.
    #[instrument(skip(self))]
    async fn remove_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        rule: Vec<String>,
    ) -> casbin::Result<bool> {
        let deleted = self
            .delete_exact(ptype, &rule)
            .await
            .map_err(adapter_error)?;
        debug!(deleted, "Removed policy rule");
        Ok(deleted > 0)
    }

    #[instrument(skip(self, rules), fields(count = rules.len()))]
    async fn remove_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        rules: Vec<Vec<String>>,
    ) -> casbin::Result<bool> {
        let mut deleted = 0;
        for rule in &rules {
            deleted += self
                .delete_exact(ptype, rule)
                .await
                .map_err(adapter_error)?;
        }
        debug!(deleted, "Removed policy rules");
        Ok(deleted > 0)
    }

    /// Deletes every document of `ptype` whose values starting at
    /// `field_index` equal `field_values`.
    ///
    /// Out of range positions are rejected with `Ok(false)`.
    #[instrument(skip(self))]
    async fn remove_filtered_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: Vec<String>,
    ) -> casbin::Result<bool> {
        let deleted = self
            .delete_filtered(ptype, field_index, &field_values)
            .await
            .map_err(adapter_error)?;
        match deleted {
            Some(deleted) => {
                debug!(deleted, "Removed filtered policy");
                Ok(deleted > 0)
            }
            None => {
                debug!("Field range out of bounds");
                Ok(false)
            }
        }
    }
}
