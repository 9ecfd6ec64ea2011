//! MongoDB client, collection wrapper, and the Mongo-backed channel store

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::{ChannelDoc, Metadata, RecordingState, CHANNEL_COLLECTION};
use crate::db::ChannelStore;
use crate::types::Error;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, Error> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Error::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, Error>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, Error> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), Error> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| Error::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, Error> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| Error::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, Error> {
        // Add is_deleted check
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| Error::Database(format!("Find failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, Error> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| Error::Database(format!("Update failed: {}", e)))
    }
}

/// Mongo-backed channel store
#[derive(Clone)]
pub struct MongoChannelStore {
    channels: MongoCollection<ChannelDoc>,
}

impl MongoChannelStore {
    /// Create the store and apply channel indexes
    pub async fn new(client: &MongoClient) -> Result<Self, Error> {
        let channels = client.collection::<ChannelDoc>(CHANNEL_COLLECTION).await?;
        Ok(Self { channels })
    }
}

#[async_trait::async_trait]
impl ChannelStore for MongoChannelStore {
    async fn get_by_passphrase(&self, passphrase: &str) -> Result<Option<ChannelDoc>, Error> {
        self.channels
            .find_one(doc! {
                "$or": [
                    { "host_passphrase": passphrase },
                    { "viewer_passphrase": passphrase },
                ]
            })
            .await
    }

    async fn insert(&self, channel: ChannelDoc) -> Result<ObjectId, Error> {
        self.channels.insert_one(channel).await
    }

    async fn update_recording(
        &self,
        channel_id: ObjectId,
        state: Option<&RecordingState>,
    ) -> Result<(), Error> {
        let update = match state {
            Some(state) => {
                let parts = bson::to_bson(&state.to_parts())
                    .map_err(|e| Error::Database(format!("BSON encode failed: {}", e)))?;
                doc! {
                    "$set": {
                        "recording": parts,
                        "metadata.updated_at": DateTime::now(),
                    }
                }
            }
            None => doc! {
                "$unset": { "recording": "" },
                "$set": { "metadata.updated_at": DateTime::now() },
            },
        };

        let result = self
            .channels
            .update_one(doc! { "_id": channel_id }, update)
            .await?;

        if result.matched_count == 0 {
            return Err(Error::Database(format!(
                "No channel with id {} to update",
                channel_id
            )));
        }

        Ok(())
    }
}
