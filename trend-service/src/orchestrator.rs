//! Sequences one census run: credentials, keywords, sampling, persistence.

use crate::aggregator::TrendAggregator;
use crate::loader::load_keywords;
use crate::sampler::{in_window_posts, sample_comments, CommentLimits};
use chrono::NaiveDate;
use database::{persist_snapshot, PersistOutcome};
use futures::TryStreamExt;
use std::time::Instant;
use tracing::info;
use trends_core::{
    Clock, CoreError, ForumClient, KeywordSet, ObjectStore, SecretStore, StoreConnector,
    TimeWindow, TrendCounts, TrendsConfig, WarehouseCredentials,
};

/// The external systems a run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub secrets: &'a dyn SecretStore,
    pub objects: &'a dyn ObjectStore,
    pub forum: &'a dyn ForumClient,
    pub connector: &'a dyn StoreConnector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusReport {
    pub snapshot_date: NaiveDate,
    pub window: TimeWindow,
    pub posts_processed: usize,
    pub trends: TrendCounts,
    pub outcome: PersistOutcome,
}

/// Runs the census for the UTC day before `clock.now()` and persists it.
pub async fn run_census(
    config: &TrendsConfig,
    deps: Collaborators<'_>,
    clock: &dyn Clock,
) -> Result<CensusReport, CoreError> {
    let window = TimeWindow::previous_day(clock.now());
    let snapshot_date = window.snapshot_date();

    let credentials = fetch_credentials(deps.secrets, &config.secret_name).await?;

    let keywords = load_keywords(deps.objects, &config.bucket, &config.keywords_key).await?;
    let (trends, posts_processed) = analyze(config, deps.forum, &keywords, window).await?;

    let outcome = save(deps.connector, &credentials, snapshot_date, &trends, clock).await?;

    Ok(CensusReport {
        snapshot_date,
        window,
        posts_processed,
        trends,
        outcome,
    })
}

async fn fetch_credentials(
    secrets: &dyn SecretStore,
    name: &str,
) -> Result<WarehouseCredentials, CoreError> {
    let start = Instant::now();
    let credentials = secrets.get_secret(name).await?;
    info!("Secrets retrieval took: {:?}", start.elapsed());
    Ok(credentials)
}

/// Counts keyword mentions over the window's posts and their top comments.
/// Returns the counts and the number of in-window posts.
pub async fn analyze(
    config: &TrendsConfig,
    forum: &dyn ForumClient,
    keywords: &KeywordSet,
    window: TimeWindow,
) -> Result<(TrendCounts, usize), CoreError> {
    let start = Instant::now();
    info!("Collecting posts from r/{} in {}", config.subreddit, window);

    let limits = CommentLimits {
        initial_fetch: config.initial_comment_fetch,
        keep: config.top_comments_limit,
    };
    let mut aggregator = TrendAggregator::new(keywords);
    let mut posts_processed = 0usize;

    let mut posts = in_window_posts(forum, &config.subreddit, config.post_limit, window);
    while let Some(post) = posts.try_next().await? {
        posts_processed += 1;
        let comments = sample_comments(forum, &post, limits, window).await;
        aggregator.record_post(&post, &comments);

        if posts_processed % 10 == 0 {
            info!("Processed {} posts", posts_processed);
        }
    }

    let trends = aggregator.into_counts();
    info!("Processing posts took: {:?}", start.elapsed());
    info!(
        "Found {} trending keywords from {} posts",
        trends.len(),
        posts_processed
    );
    Ok((trends, posts_processed))
}

/// Connects, writes through the daily gate, and closes the connection
/// whether or not the write succeeded.
async fn save(
    connector: &dyn StoreConnector,
    credentials: &WarehouseCredentials,
    date: NaiveDate,
    trends: &TrendCounts,
    clock: &dyn Clock,
) -> Result<PersistOutcome, CoreError> {
    let start = Instant::now();
    let store = connector.connect(credentials).await?;
    info!("Database connection took: {:?}", start.elapsed());

    let result = persist_snapshot(store.as_ref(), date, trends, clock.now()).await;
    store.close().await;

    info!("Total database save took: {:?}", start.elapsed());
    result
}
