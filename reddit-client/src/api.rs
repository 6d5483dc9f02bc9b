use crate::metrics::{MetricsCollector, RequestMetrics};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use trends_core::{CommentNode, CoreError, MoreComments, RedditApiError, RedditComment, RedditPost};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page Reddit serves for a listing.
pub const LISTING_PAGE_LIMIT: usize = 100;

/// Largest number of ids `/api/morechildren` accepts per call.
pub const MORE_CHILDREN_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<MetricsCollector>,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth()));
        let metrics = Arc::new(MetricsCollector::new());

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter,
            metrics,
        })
    }

    /// Sends one request. `route` names the endpoint for metrics with ids
    /// elided; `not_found` is the error a 404 turns into.
    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        route: &str,
        access_token: &str,
        query_params: &[(&str, String)],
        not_found: RedditApiError,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let start_time = Instant::now();
        info!("Making Reddit API request: {} {}", method, endpoint);
        let sent = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await;

        let (outcome, status_code) = match sent {
            Ok(response) => {
                let status = response.status().as_u16();
                (check_status(response, endpoint, not_found), Some(status))
            }
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                let err = if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                };
                (Err(err), None)
            }
        };

        let rate_limited = matches!(
            outcome,
            Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded { .. }))
        );
        self.metrics
            .record_request(RequestMetrics {
                route: route.to_string(),
                method: method.to_string(),
                status_code,
                response_time: start_time.elapsed(),
                success: outcome.is_ok(),
                rate_limited,
            })
            .await;

        outcome
    }

    /// One page of `/r/{subreddit}/new`.
    pub async fn get_new_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let mut params = vec![
            ("limit", limit.min(LISTING_PAGE_LIMIT).to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(after_val) = after {
            params.push(("after", after_val.to_string()));
        }

        let response = self
            .make_request(
                Method::GET,
                &endpoint,
                "/r/{subreddit}/new",
                access_token,
                &params,
                RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                },
            )
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// The comment forest of one post, as first served.
    pub async fn get_comments(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<Vec<CommentNode>, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let params = [("raw_json", "1".to_string())];

        let response = self
            .make_request(
                Method::GET,
                &endpoint,
                "/comments/{id}",
                access_token,
                &params,
                RedditApiError::PostNotFound {
                    post_id: post_id.to_string(),
                },
            )
            .await?;

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse comments for {}: {}", post_id, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comments for post {}", post_id),
            })
        })?;

        // The response is [post listing, comment listing].
        let listing = body.get(1).ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Comment listing missing for post {}", post_id),
            })
        })?;

        let roots = parse_comment_listing(listing);
        debug!("Retrieved {} top-level comment nodes for {}", roots.len(), post_id);
        Ok(roots)
    }

    /// Resolves up to [`MORE_CHILDREN_LIMIT`] comment ids of one post.
    pub async fn get_more_children(
        &self,
        access_token: &str,
        link_fullname: &str,
        children: &[String],
    ) -> Result<Vec<RedditComment>, CoreError> {
        let ids = &children[..children.len().min(MORE_CHILDREN_LIMIT)];
        let params = [
            ("api_type", "json".to_string()),
            ("link_id", link_fullname.to_string()),
            ("children", ids.join(",")),
            ("limit_children", "false".to_string()),
            ("raw_json", "1".to_string()),
        ];

        let response = self
            .make_request(
                Method::GET,
                "/api/morechildren",
                "/api/morechildren",
                access_token,
                &params,
                RedditApiError::PostNotFound {
                    post_id: link_fullname.to_string(),
                },
            )
            .await?;

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse morechildren response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse expanded comments for {}", link_fullname),
            })
        })?;

        let comments = parse_more_children(&body)?;
        debug!(
            "Expanded {} of {} requested comments for {}",
            comments.len(),
            ids.len(),
            link_fullname
        );
        Ok(comments)
    }

    pub async fn get_metrics(&self) -> crate::metrics::ApiMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn get_rate_limit_status(&self) -> crate::rate_limiter::RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }

    pub async fn export_metrics(&self) -> Result<String, CoreError> {
        Ok(self.metrics.export_metrics().await?)
    }
}

fn check_status(
    response: Response,
    endpoint: &str,
    not_found: RedditApiError,
) -> Result<Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        debug!("Request successful: {} {}", status, endpoint);
        return Ok(response);
    }

    error!("Request failed with status: {} for {}", status, endpoint);
    let err = match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => not_found,
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    };
    Err(CoreError::RedditApi(err))
}

/// Converts a comment `Listing` into tree nodes. Unknown kinds are skipped.
pub fn parse_comment_listing(listing: &Value) -> Vec<CommentNode> {
    let Some(children) = listing["data"]["children"].as_array() else {
        return Vec::new();
    };

    children
        .iter()
        .filter_map(|child| {
            let data = &child["data"];
            match child["kind"].as_str()? {
                "t1" => Some(CommentNode::Comment {
                    comment: parse_comment(data)?,
                    // `replies` is an empty string when there are none.
                    replies: parse_comment_listing(&data["replies"]),
                }),
                "more" => parse_more(data).map(CommentNode::More),
                _ => None,
            }
        })
        .collect()
}

/// Pulls the comments out of a `/api/morechildren` response. Nested `more`
/// stubs are dropped.
pub fn parse_more_children(body: &Value) -> Result<Vec<RedditComment>, CoreError> {
    if let Some(errors) = body["json"]["errors"].as_array() {
        if !errors.is_empty() {
            return Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("morechildren returned errors: {}", Value::from(errors.clone())),
            }));
        }
    }

    let things = body["json"]["data"]["things"].as_array().ok_or_else(|| {
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "morechildren response has no things".to_string(),
        })
    })?;

    Ok(things
        .iter()
        .filter(|thing| thing["kind"].as_str() == Some("t1"))
        .filter_map(|thing| parse_comment(&thing["data"]))
        .collect())
}

fn parse_comment(data: &Value) -> Option<RedditComment> {
    Some(RedditComment {
        id: data["id"].as_str()?.to_string(),
        parent_id: data["parent_id"].as_str().unwrap_or_default().to_string(),
        body: data["body"].as_str().map(str::to_string),
        score: data["score"]
            .as_i64()
            .or_else(|| data["score"].as_f64().map(|s| s as i64)),
        created_utc: data["created_utc"].as_f64().map(|ts| ts as i64),
    })
}

fn parse_more(data: &Value) -> Option<MoreComments> {
    Some(MoreComments {
        id: data["id"].as_str()?.to_string(),
        parent_id: data["parent_id"].as_str().unwrap_or_default().to_string(),
        count: data["count"].as_u64().unwrap_or(0) as u32,
        children: data["children"]
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            body: post_data.selftext,
            subreddit: post_data.subreddit,
            created_utc: post_data.created_utc as i64,
        }
    }
}
