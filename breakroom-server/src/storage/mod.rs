//! Object storage for uploaded files
//!
//! Gallery artwork goes to S3 in production. Tests and local runs can use
//! the in-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to upload {key}: {reason}")]
    Put { key: String, reason: String },

    #[error("failed to delete {key}: {reason}")]
    Delete { key: String, reason: String },
}

/// Blob store keyed by path-like object keys
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn public_url(&self, key: &str) -> String;
}

/// S3 bucket store
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: StorageConfig,
}

impl S3Store {
    pub fn new(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Build a client from the ambient AWS credentials chain.
    pub async fn from_env(config: StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        tracing::info!(bucket = %config.bucket, region = %config.region, "using S3 storage");
        Self::new(Client::new(&sdk_config), config)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Put {
                key: key.to_owned(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(key, "uploaded object");
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_owned(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.config.object_url(key)
    }
}

/// Process-local store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    config: StorageConfig,
}

impl MemoryStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            objects: Arc::default(),
            config,
        }
    }

    /// Stored bytes and content type for `key`.
    pub async fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects
            .lock()
            .await
            .insert(key.to_owned(), (bytes, content_type.to_owned()));
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.config.object_url(key)
    }
}
