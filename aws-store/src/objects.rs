use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use std::time::Instant;
use tracing::{debug, error};
use trends_core::{CoreError, ObjectStore, StorageError};

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CoreError> {
        let start = Instant::now();

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                error!("S3 error for s3://{}/{}: {}", bucket, key, DisplayErrorContext(&service_error));
                if service_error.is_no_such_key() {
                    StorageError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::ReadFailed {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        reason: DisplayErrorContext(&service_error).to_string(),
                    }
                }
            })?;

        let data = output.body.collect().await.map_err(|e| StorageError::ReadFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Getting S3 object took: {:?}", start.elapsed());
        Ok(data.into_bytes().to_vec())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, CoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| StorageError::ListFailed {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }
}
