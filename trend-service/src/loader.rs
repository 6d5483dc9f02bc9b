use std::time::Instant;
use tracing::{debug, info, warn};
use trends_core::{parse_keywords, CoreError, KeywordSet, ObjectStore};

/// Fetches and parses the keyword file at `s3://{bucket}/{key}`.
pub async fn load_keywords(
    objects: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<KeywordSet, CoreError> {
    let start = Instant::now();
    info!("Loading keywords from s3://{}/{}", bucket, key);

    let list_start = Instant::now();
    let keys = objects.list_keys(bucket, parent_prefix(key)).await?;
    for found in &keys {
        debug!("Found object: {}", found);
    }
    debug!("Listing bucket contents took: {:?}", list_start.elapsed());

    let get_start = Instant::now();
    let raw = objects.get_object(bucket, key).await?;
    info!("Getting keyword object took: {:?}", get_start.elapsed());

    let parse_start = Instant::now();
    let keywords = parse_keywords(&raw)?;
    debug!("Processing keywords took: {:?}", parse_start.elapsed());

    if keywords.is_empty() {
        warn!("Keyword file s3://{}/{} contains no keywords", bucket, key);
    }
    info!(
        "Loaded {} keywords in {:?}",
        keywords.len(),
        start.elapsed()
    );
    Ok(keywords)
}

/// `"dir/sub/file.csv"` lists under `"dir/sub/"`; a bare key lists the bucket root.
fn parent_prefix(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[..=idx],
        None => "",
    }
}
