//! Invocation entry point and its JSON result.

use crate::orchestrator::{run_census, Collaborators, CensusReport};
use aws_store::{load_sdk_config, S3ObjectStore, SecretsManagerStore};
use database::{PersistOutcome, PgConnector};
use reddit_client::RedditClient;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use trends_core::{
    Clock, CoreError, ErrorReporter, RedditCredentials, SystemClock, TrendsConfig,
};

pub const SUCCESS_BODY: &str = "Successfully processed and saved Reddit trends";

/// Per-invocation metadata supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationContext {
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(rename = "executionTime", skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_processed: Option<String>,
}

impl InvocationResult {
    pub fn success(report: &CensusReport, elapsed: Duration) -> Self {
        Self {
            status_code: 200,
            body: SUCCESS_BODY.to_string(),
            execution_time: Some(format!("{:?}", elapsed)),
            date_processed: Some(report.snapshot_date.to_string()),
        }
    }

    pub fn failure(error: &CoreError) -> Self {
        Self {
            status_code: 500,
            body: format!("Error: {}", error),
            execution_time: None,
            date_processed: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Runs one census with configuration from the environment and the
/// production collaborators. Never fails; errors become a 500 result.
pub async fn handle(event: serde_json::Value, context: InvocationContext) -> InvocationResult {
    let started = Instant::now();
    info!("Starting execution for request '{}'", context.request_id);
    debug!("Invocation event: {}", event);

    let result = match TrendsConfig::load() {
        Ok(config) => run_production(&config).await,
        Err(e) => Err(e.into()),
    };
    finish(result, started)
}

/// [`handle`] with the configuration and collaborators supplied by the
/// caller.
pub async fn invoke(
    config: &TrendsConfig,
    deps: Collaborators<'_>,
    clock: &dyn Clock,
) -> InvocationResult {
    let started = Instant::now();
    finish(run_census(config, deps, clock).await, started)
}

async fn run_production(config: &TrendsConfig) -> Result<CensusReport, CoreError> {
    let sdk_config = load_sdk_config(&config.region).await;
    let secrets = SecretsManagerStore::new(&sdk_config);
    let objects = S3ObjectStore::new(&sdk_config);

    let reddit_start = Instant::now();
    let reddit = RedditClient::connect(RedditCredentials::from_env()?).await?;
    info!("Reddit connection took: {:?}", reddit_start.elapsed());

    let deps = Collaborators {
        secrets: &secrets,
        objects: &objects,
        forum: &reddit,
        connector: &PgConnector,
    };
    let report = run_census(config, deps, &SystemClock).await;

    let metrics = reddit.get_api_metrics().await;
    info!(
        "Reddit API: {} requests, {} failed, {} rate limited, average {:?}",
        metrics.total_requests,
        metrics.failed_requests,
        metrics.rate_limited_requests,
        metrics.average_response_time()
    );
    let limiter = reddit.get_rate_limit_status().await;
    info!(
        "Rate limiter granted {} permits, waited {:?} in total",
        limiter.permits_granted, limiter.total_wait
    );
    match reddit.export_api_metrics().await {
        Ok(exported) => debug!("Reddit API metrics by route: {}", exported),
        Err(e) => ErrorReporter::new().report_warning(&e),
    }
    report
}

fn finish(result: Result<CensusReport, CoreError>, started: Instant) -> InvocationResult {
    let elapsed = started.elapsed();
    match result {
        Ok(report) => {
            if let PersistOutcome::Skipped { existing_rows } = report.outcome {
                info!(
                    "Snapshot for {} was already present with {} rows",
                    report.snapshot_date, existing_rows
                );
            }
            info!("Total execution took: {:?}", elapsed);
            InvocationResult::success(&report, elapsed)
        }
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            InvocationResult::failure(&e)
        }
    }
}
