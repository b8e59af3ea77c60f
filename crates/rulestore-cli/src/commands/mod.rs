pub mod policy;
pub mod transfer;

use anyhow::{Context, Result};
use rulestore_adapter::RuleStoreAdapter;
use rulestore_db_mongo::{MongoConfig, MongoRuleCollection};

pub type MongoAdapter = RuleStoreAdapter<MongoRuleCollection>;

pub async fn connect(config: &MongoConfig) -> Result<MongoAdapter> {
    let collection = MongoRuleCollection::connect(config)
        .await
        .context("Failed to open rule collection")?;
    Ok(RuleStoreAdapter::new(collection))
}

fn section(ptype: &str) -> Result<&str> {
    rulestore_core::section_of(ptype).context("Policy type must not be empty")
}
