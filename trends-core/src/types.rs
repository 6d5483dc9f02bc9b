use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{hash_map, HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    /// Self-text; empty for link posts.
    pub body: String,
    pub subreddit: String,
    pub created_utc: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditComment {
    pub id: String,
    /// Fullname of the parent thing (`t1_...` for a comment, `t3_...` for the post).
    pub parent_id: String,
    pub body: Option<String>,
    pub score: Option<i64>,
    pub created_utc: Option<i64>,
}

impl RedditComment {
    pub fn fullname(&self) -> String {
        format!("t1_{}", self.id)
    }

    /// Ranking score; comments without one rank as zero.
    pub fn rank_score(&self) -> i64 {
        self.score.unwrap_or(0)
    }
}

/// A "load more comments" stub standing in for replies that were not sent
/// with the initial listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreComments {
    pub id: String,
    pub parent_id: String,
    pub count: u32,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentNode {
    Comment {
        comment: RedditComment,
        replies: Vec<CommentNode>,
    },
    More(MoreComments),
}

impl CommentNode {
    pub fn leaf(comment: RedditComment) -> Self {
        CommentNode::Comment {
            comment,
            replies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: HashSet<String>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trims and lowercases `raw`; blank input is ignored. Returns whether a
    /// new keyword was added.
    pub fn insert(&mut self, raw: &str) -> bool {
        let keyword = raw.trim().to_lowercase();
        if keyword.is_empty() {
            return false;
        }
        self.keywords.insert(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::new();
        for raw in iter {
            set.insert(raw.as_ref());
        }
        set
    }
}

/// Keyword mention counts for one run. Only keywords that were seen at
/// least once are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendCounts {
    counts: HashMap<String, u64>,
}

impl TrendCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, keyword: &str) {
        *self.counts.entry(keyword.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, keyword: &str) -> u64 {
        self.counts.get(keyword).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, u64> {
        self.counts.iter()
    }

    pub fn into_map(self) -> HashMap<String, u64> {
        self.counts
    }
}

/// One row of the `REDDIT_TRENDS` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub trend_id: Uuid,
    pub snapshot_time: DateTime<Utc>,
    pub snapshot_date: NaiveDate,
    pub keyword: String,
    pub mention_count: i64,
}

/// Connection details held in the secret store.
#[derive(Clone, Deserialize)]
pub struct WarehouseCredentials {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

impl std::fmt::Debug for WarehouseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_set_normalizes_and_dedupes() {
        let set: KeywordSet = ["  Rust ", "rust", "", "   ", "CACHE"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("rust"));
        assert!(set.contains("cache"));
    }

    #[test]
    fn test_trend_counts_only_hold_recorded_keywords() {
        let mut counts = TrendCounts::new();
        counts.record("rust");
        counts.record("rust");
        counts.record("cache");

        assert_eq!(counts.get("rust"), 2);
        assert_eq!(counts.get("cache"), 1);
        assert_eq!(counts.get("python"), 0);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_missing_score_ranks_as_zero() {
        let comment = RedditComment {
            id: "c1".to_string(),
            parent_id: "t3_p1".to_string(),
            body: None,
            score: None,
            created_utc: None,
        };
        assert_eq!(comment.rank_score(), 0);
        assert_eq!(comment.fullname(), "t1_c1");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = WarehouseCredentials {
            user: "loader".to_string(),
            password: "hunter2".to_string(),
            account: "db.internal".to_string(),
            warehouse: "analytics".to_string(),
            database: "trends".to_string(),
            schema: "public".to_string(),
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
