//! [`RuleCollection`] on the official MongoDB driver.

use async_trait::async_trait;
use bson::Document;
use futures_util::{StreamExt, TryStreamExt};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use rulestore_storage::{
    DeleteResult, DocumentStream, InsertManyResult, InsertOneResult, RuleCollection,
    StorageError, StorageResult,
};
use tracing::{debug, info, instrument};

use crate::config::{MongoConfig, mask_password};

fn driver(err: mongodb::error::Error) -> StorageError {
    StorageError::backend(err)
}

/// A MongoDB collection holding policy rules.
///
/// Cloning is cheap; clones share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoRuleCollection {
    collection: Collection<Document>,
}

impl MongoRuleCollection {
    /// Connects to the server named by `config` and opens the rule collection.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the connection
    /// string cannot be parsed.
    #[instrument(skip(config), fields(uri = %mask_password(&config.uri)))]
    pub async fn connect(config: &MongoConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::connection_error)?;
        info!(
            database = %config.database,
            collection = %config.collection,
            "Opening MongoDB rule collection"
        );

        let mut options = ClientOptions::parse(config.uri.as_str()).await.map_err(driver)?;
        if let Some(app_name) = &config.app_name {
            options.app_name = Some(app_name.clone());
        }
        let client = Client::with_options(options).map_err(driver)?;

        Ok(Self::from_client(&client, &config.database, &config.collection))
    }

    /// Opens `database.collection` on an existing client.
    #[must_use]
    pub fn from_client(client: &Client, database: &str, collection: &str) -> Self {
        Self::from_collection(client.database(database).collection(collection))
    }

    /// Wraps an already opened driver collection.
    #[must_use]
    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl RuleCollection for MongoRuleCollection {
    async fn find(&self, filter: Document) -> StorageResult<DocumentStream> {
        debug!(collection = %self.collection.name(), ?filter, "find");
        let cursor = self.collection.find(filter).await.map_err(driver)?;
        Ok(cursor.map_err(driver).boxed())
    }

    async fn insert_one(&self, document: Document) -> StorageResult<InsertOneResult> {
        debug!(collection = %self.collection.name(), ?document, "insert_one");
        let result = self.collection.insert_one(document).await.map_err(driver)?;
        Ok(InsertOneResult {
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(&self, documents: Vec<Document>) -> StorageResult<InsertManyResult> {
        // The server rejects empty batches.
        if documents.is_empty() {
            return Ok(InsertManyResult {
                inserted_ids: Vec::new(),
            });
        }
        debug!(collection = %self.collection.name(), count = documents.len(), "insert_many");
        let result = self.collection.insert_many(documents).await.map_err(driver)?;

        let mut ids: Vec<_> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(InsertManyResult {
            inserted_ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn delete_many(&self, filter: Document) -> StorageResult<DeleteResult> {
        debug!(collection = %self.collection.name(), ?filter, "delete_many");
        let result = self.collection.delete_many(filter).await.map_err(driver)?;
        Ok(DeleteResult::new(result.deleted_count))
    }
}
