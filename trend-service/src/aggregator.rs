use trends_core::{KeywordSet, RedditComment, RedditPost, TrendCounts};

/// Accumulates keyword mentions across a run.
///
/// Each text unit counts a keyword at most once, and matching is plain
/// substring containment on lowercased text.
#[derive(Debug)]
pub struct TrendAggregator<'a> {
    keywords: &'a KeywordSet,
    counts: TrendCounts,
}

impl<'a> TrendAggregator<'a> {
    pub fn new(keywords: &'a KeywordSet) -> Self {
        Self {
            keywords,
            counts: TrendCounts::new(),
        }
    }

    pub fn scan(&mut self, text: &str) {
        let text = text.to_lowercase();
        for keyword in self.keywords.iter() {
            if text.contains(keyword) {
                self.counts.record(keyword);
            }
        }
    }

    /// Scans the title, the body when present, and every comment body.
    pub fn record_post(&mut self, post: &RedditPost, comments: &[RedditComment]) {
        self.scan(&post.title);
        if !post.body.is_empty() {
            self.scan(&post.body);
        }
        for comment in comments {
            self.scan(comment.body.as_deref().unwrap_or_default());
        }
    }

    pub fn counts(&self) -> &TrendCounts {
        &self.counts
    }

    pub fn into_counts(self) -> TrendCounts {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> KeywordSet {
        words.iter().collect()
    }

    #[test]
    fn test_keyword_counts_once_per_unit() {
        let set = keywords(&["data"]);
        let mut aggregator = TrendAggregator::new(&set);
        aggregator.scan("data data data");
        assert_eq!(aggregator.counts().get("data"), 1);
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let set = keywords(&["cat"]);
        let mut aggregator = TrendAggregator::new(&set);
        aggregator.scan("A CATEGORY of things");
        assert_eq!(aggregator.counts().get("cat"), 1);
    }

    fn self_post(title: &str, body: &str) -> RedditPost {
        RedditPost {
            id: "p9".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            subreddit: "test".to_string(),
            created_utc: 0,
        }
    }

    fn reply(body: &str) -> RedditComment {
        RedditComment {
            id: "c9".to_string(),
            parent_id: "t3_p9".to_string(),
            body: Some(body.to_string()),
            score: Some(1),
            created_utc: Some(0),
        }
    }

    #[test]
    fn test_title_body_and_comment_each_count() {
        let set = keywords(&["kafka"]);
        let mut aggregator = TrendAggregator::new(&set);
        aggregator.record_post(
            &self_post("Kafka lag", "Our KAFKA consumers fall behind"),
            &[reply("kafka streams fixed it")],
        );
        assert_eq!(aggregator.counts().get("kafka"), 3);
    }

    #[test]
    fn test_keyword_only_in_body() {
        let set = keywords(&["airflow", "dagster"]);
        let mut aggregator = TrendAggregator::new(&set);
        aggregator.record_post(
            &self_post("Which orchestrator?", "We run Airflow on k8s"),
            &[],
        );
        let counts = aggregator.into_counts();
        assert_eq!(counts.get("airflow"), 1);
        assert_eq!(counts.get("dagster"), 0);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_record_post_counts_each_unit() {
        let set = keywords(&["rust", "cache", "python"]);
        let post = RedditPost {
            id: "p1".to_string(),
            title: "Rust cache design".to_string(),
            body: String::new(),
            subreddit: "test".to_string(),
            created_utc: 0,
        };
        let comments = vec![
            RedditComment {
                id: "c1".to_string(),
                parent_id: "t3_p1".to_string(),
                body: Some("I love rust".to_string()),
                score: Some(10),
                created_utc: Some(0),
            },
            RedditComment {
                id: "c2".to_string(),
                parent_id: "t3_p1".to_string(),
                body: None,
                score: None,
                created_utc: Some(0),
            },
        ];

        let mut aggregator = TrendAggregator::new(&set);
        aggregator.record_post(&post, &comments);
        let counts = aggregator.into_counts();

        assert_eq!(counts.get("rust"), 2);
        assert_eq!(counts.get("cache"), 1);
        assert_eq!(counts.len(), 2);
    }
}
