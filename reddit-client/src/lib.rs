pub mod api;
pub mod metrics;
pub mod rate_limiter;


use api::{RedditApiClient, MORE_CHILDREN_LIMIT};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use oauth2::basic::BasicClient;
use oauth2::http::header::USER_AGENT;
use oauth2::http::HeaderValue;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, HttpRequest, Scope, TokenResponse, TokenUrl};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, info};
use trends_core::{
    CommentTree, ConfigError, CoreError, ForumClient, MoreComments, RedditApiError,
    RedditComment, RedditCredentials, RedditPost, REDDIT_USER_AGENT_VAR,
};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens this close to expiry are refreshed before use.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + TOKEN_EXPIRY_MARGIN >= self.expires_at
    }
}

/// Application-only Reddit client: authenticates with the client-credentials
/// grant and reads public listings.
pub struct RedditClient {
    credentials: RedditCredentials,
    oauth_client: BasicClient,
    api_client: RedditApiClient,
    token: RwLock<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("Invalid auth URL: {}", e),
        })?;
        let token_url =
            TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| CoreError::Internal {
                message: format!("Invalid token URL: {}", e),
            })?;

        let oauth_client = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        );
        let api_client = RedditApiClient::new(credentials.user_agent.clone())?;

        Ok(Self {
            credentials,
            oauth_client,
            api_client,
            token: RwLock::new(None),
        })
    }

    /// Builds a client and fetches its first access token.
    pub async fn connect(credentials: RedditCredentials) -> Result<Self, CoreError> {
        let client = Self::new(credentials)?;
        client.authenticate().await?;
        Ok(client)
    }

    pub async fn authenticate(&self) -> Result<(), CoreError> {
        let user_agent = HeaderValue::from_str(&self.credentials.user_agent).map_err(|_| {
            ConfigError::InvalidValue {
                field: REDDIT_USER_AGENT_VAR.to_string(),
                value: self.credentials.user_agent.clone(),
            }
        })?;

        debug!("Requesting application-only Reddit token");
        let response = self
            .oauth_client
            .exchange_client_credentials()
            .add_scope(Scope::new("read".to_string()))
            .request_async(move |mut request: HttpRequest| {
                request.headers.insert(USER_AGENT, user_agent);
                async_http_client(request)
            })
            .await
            .map_err(|e| RedditApiError::AuthenticationFailed {
                reason: e.to_string(),
            })?;

        let expires_in = response
            .expires_in()
            .unwrap_or_else(|| Duration::from_secs(3600));
        let token = RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + expires_in,
            scope: response
                .scopes()
                .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
                .unwrap_or_default(),
        };

        info!("Authenticated with Reddit, token valid for {:?}", expires_in);
        *self.token.write().await = Some(token);
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(&*self.token.read().await, Some(token) if !token.is_expired())
    }

    pub async fn set_token(&self, token: RedditToken) {
        *self.token.write().await = Some(token);
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        if let Some(token) = &*self.token.read().await {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        self.authenticate().await?;
        self.token
            .read()
            .await
            .as_ref()
            .map(|token| token.access_token.clone())
            .ok_or_else(|| CoreError::RedditApi(RedditApiError::InvalidToken))
    }

    async fn next_post(
        &self,
        community: &str,
        mut page: PageState,
    ) -> Result<Option<(RedditPost, PageState)>, CoreError> {
        loop {
            if page.remaining == 0 {
                return Ok(None);
            }
            if let Some(post) = page.buffered.pop_front() {
                page.remaining -= 1;
                return Ok(Some((post, page)));
            }
            if page.exhausted {
                return Ok(None);
            }

            let token = self.access_token().await?;
            let listing = self
                .api_client
                .get_new_posts(&token, community, page.remaining, page.after.as_deref())
                .await?;

            page.after = listing.data.after;
            page.exhausted = page.after.is_none() || listing.data.children.is_empty();
            page.buffered
                .extend(listing.data.children.into_iter().map(|child| child.data.into()));
        }
    }

    pub async fn get_api_metrics(&self) -> metrics::ApiMetrics {
        self.api_client.get_metrics().await
    }

    pub async fn get_rate_limit_status(&self) -> rate_limiter::RateLimitStatus {
        self.api_client.get_rate_limit_status().await
    }

    /// Request metrics as pretty-printed JSON.
    pub async fn export_api_metrics(&self) -> Result<String, CoreError> {
        self.api_client.export_metrics().await
    }
}

struct PageState {
    after: Option<String>,
    remaining: usize,
    buffered: VecDeque<RedditPost>,
    exhausted: bool,
}

#[async_trait]
impl ForumClient for RedditClient {
    fn newest<'a>(
        &'a self,
        community: &'a str,
        limit: usize,
    ) -> BoxStream<'a, Result<RedditPost, CoreError>> {
        let page = PageState {
            after: None,
            remaining: limit,
            buffered: VecDeque::new(),
            exhausted: false,
        };
        stream::try_unfold(page, move |page| self.next_post(community, page)).boxed()
    }

    async fn comments(&self, post: &RedditPost) -> Result<CommentTree, CoreError> {
        let token = self.access_token().await?;
        let roots = self.api_client.get_comments(&token, &post.id).await?;
        Ok(CommentTree::new(roots))
    }

    async fn expand(
        &self,
        post: &RedditPost,
        placeholders: &[MoreComments],
    ) -> Result<Vec<RedditComment>, CoreError> {
        let children: Vec<String> = placeholders
            .iter()
            .flat_map(|more| more.children.iter().cloned())
            .collect();
        if children.is_empty() {
            return Ok(Vec::new());
        }
        if children.len() > MORE_CHILDREN_LIMIT {
            debug!(
                "Post {} has {} hidden comments, expanding the first {}",
                post.id,
                children.len(),
                MORE_CHILDREN_LIMIT
            );
        }

        let token = self.access_token().await?;
        self.api_client
            .get_more_children(&token, &format!("t3_{}", post.id), &children)
            .await
    }
}
