use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::time::{Duration, Instant};

/// Bucket shared with the translation service.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl S3Storage {
    /// `endpoint_url` points at an S3-compatible provider (MinIO, R2, ...);
    /// plain `http://` endpoints are allowed for local setups.
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID, instance profile, ...).
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    fn path(key: &str) -> StorageResult<Path> {
        Path::parse(key).map_err(|e| StorageError::InvalidKey(format!("{}: {}", key, e)))
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    async fn head(&self, key: &str) -> StorageResult<bool> {
        let location = Self::path(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => {
                tracing::warn!(error = %e, bucket = %self.bucket, key = %key, "S3 head failed");
                Err(StorageError::BackendError(e.to_string()))
            }
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let start = Instant::now();
        let location = Self::path(prefix)?;

        let objects: ObjectResult<Vec<ObjectMeta>> =
            self.store.list(Some(&location)).try_collect().await;

        let objects = objects.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                prefix = %prefix,
                duration_ms = elapsed_ms(start),
                "S3 list failed"
            );
            StorageError::ListFailed(e.to_string())
        })?;

        let mut keys: Vec<String> = objects.into_iter().map(|meta| meta.location.to_string()).collect();
        keys.sort();

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = keys.len(),
            duration_ms = elapsed_ms(start),
            "S3 list successful"
        );

        Ok(keys)
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let start = Instant::now();
        let location = Self::path(key)?;

        let object = match self.store.get(&location).await {
            Ok(object) => object,
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 download failed");
                return Err(StorageError::DownloadFailed(e.to_string()));
            }
        };
        let bytes = object
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = elapsed_ms(start),
            "S3 download successful"
        );
        Ok(bytes)
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        let start = Instant::now();
        let location = Self::path(key)?;
        let size = data.len() as u64;

        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        if let Err(e) = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await
        {
            tracing::error!(error = %e, bucket = %self.bucket, key = %key, size_bytes = size, "S3 upload failed");
            return Err(StorageError::UploadFailed(e.to_string()));
        }

        tracing::info!(
            key = %key,
            size_bytes = size,
            content_type = content_type.unwrap_or("-"),
            duration_ms = elapsed_ms(start),
            "S3 upload successful"
        );
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Self::path(key)?;
        self.store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map(|url| url.to_string())
            .map_err(|e| StorageError::BackendError(format!("cannot sign {}: {}", key, e)))
    }

    fn location_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
