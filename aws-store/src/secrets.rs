use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use std::time::Instant;
use tracing::{error, info};
use trends_core::{CoreError, SecretStore, SecretsError, WarehouseCredentials};

pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<WarehouseCredentials, CoreError> {
        let start = Instant::now();
        info!("Retrieving secret {}", name);

        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                error!("Error retrieving secret {}: {}", name, DisplayErrorContext(&service_error));
                if service_error.is_resource_not_found_exception() {
                    SecretsError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    SecretsError::RetrievalFailed {
                        name: name.to_string(),
                        reason: DisplayErrorContext(&service_error).to_string(),
                    }
                }
            })?;

        let raw = output
            .secret_string()
            .ok_or_else(|| SecretsError::MissingValue {
                name: name.to_string(),
            })?;
        let credentials = parse_credentials(name, raw)?;

        info!("Secrets retrieval took: {:?}", start.elapsed());
        Ok(credentials)
    }
}

/// Parses the JSON secret string into connection credentials.
pub fn parse_credentials(name: &str, raw: &str) -> Result<WarehouseCredentials, SecretsError> {
    serde_json::from_str(raw).map_err(|e| SecretsError::Malformed {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
