//! AWS-backed collaborators: credentials from Secrets Manager and the
//! keyword file from S3.

pub mod objects;
pub mod secrets;

pub use objects::S3ObjectStore;
pub use secrets::SecretsManagerStore;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;

/// Shared SDK configuration for `region`, with credentials from the default
/// provider chain.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
