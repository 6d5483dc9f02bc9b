//! Narrow interfaces to the external systems a census run talks to.

use crate::comments::CommentTree;
use crate::error::CoreError;
use crate::types::{
    MoreComments, RedditComment, RedditPost, SnapshotRecord, WarehouseCredentials,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<WarehouseCredentials, CoreError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CoreError>;

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, CoreError>;
}

#[async_trait]
pub trait ForumClient: Send + Sync {
    /// Newest-first posts of `community`, at most `limit` of them. The stream
    /// pages lazily and cannot be restarted.
    fn newest<'a>(
        &'a self,
        community: &'a str,
        limit: usize,
    ) -> BoxStream<'a, Result<RedditPost, CoreError>>;

    /// The comment tree as first served for `post`, placeholders included.
    async fn comments(&self, post: &RedditPost) -> Result<CommentTree, CoreError>;

    /// Fetches the comments behind `placeholders` in a single request.
    /// Placeholders nested in the response are not followed.
    async fn expand(
        &self,
        post: &RedditPost,
        placeholders: &[MoreComments],
    ) -> Result<Vec<RedditComment>, CoreError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn count_for_date(&self, date: NaiveDate) -> Result<i64, CoreError>;

    /// Writes all records in one transaction.
    async fn insert_snapshot(&self, records: &[SnapshotRecord]) -> Result<(), CoreError>;

    async fn close(&self);
}

#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &WarehouseCredentials,
    ) -> Result<Box<dyn SnapshotStore>, CoreError>;
}
