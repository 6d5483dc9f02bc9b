//! Bounded sampling of posts and comments for one census window.

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::cmp::Reverse;
use tracing::{debug, warn};
use trends_core::{CoreError, ErrorReporter, ForumClient, RedditComment, RedditPost, TimeWindow};

/// Fetch and keep caps for each post's comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentLimits {
    /// How many comments, in tree order, are considered at all.
    pub initial_fetch: usize,
    /// How many of those survive ranking.
    pub keep: usize,
}

/// Posts from the newest `limit` of `community` that fall inside `window`.
///
/// The feed is not assumed to be in time order, so posts outside the window
/// are skipped without ending the scan. Listing errors end the stream.
pub fn in_window_posts<'a>(
    forum: &'a dyn ForumClient,
    community: &'a str,
    limit: usize,
    window: TimeWindow,
) -> BoxStream<'a, Result<RedditPost, CoreError>> {
    forum
        .newest(community, limit)
        .try_filter(move |post| {
            let keep = window.contains(post.created_utc);
            if !keep {
                debug!("Skipping post {} created at {}", post.id, post.created_utc);
            }
            futures::future::ready(keep)
        })
        .boxed()
}

/// Ranked, in-window comments of `post`. A failure anywhere while resolving
/// the comments is logged and yields no comments.
pub async fn sample_comments(
    forum: &dyn ForumClient,
    post: &RedditPost,
    limits: CommentLimits,
    window: TimeWindow,
) -> Vec<RedditComment> {
    match resolve_comments(forum, post).await {
        Ok(flat) => select_comments(flat, limits, window),
        Err(e) => {
            warn!("Error processing comments for post {}", post.id);
            ErrorReporter::new().report_warning(&e);
            Vec::new()
        }
    }
}

/// Initial tree plus one round of placeholder expansion, flattened
/// breadth-first.
pub async fn resolve_comments(
    forum: &dyn ForumClient,
    post: &RedditPost,
) -> Result<Vec<RedditComment>, CoreError> {
    let tree = forum.comments(post).await?;
    let placeholders = tree.placeholders();
    if placeholders.is_empty() {
        return Ok(tree.flatten());
    }

    let fetched = forum.expand(post, &placeholders).await?;
    debug!(
        "Expanded {} placeholders into {} comments for post {}",
        placeholders.len(),
        fetched.len(),
        post.id
    );
    Ok(tree.graft(fetched).flatten())
}

/// Takes the first `initial_fetch`, stable-sorts by score descending, keeps
/// the top `keep`, then drops comments outside `window` or without a
/// creation time.
pub fn select_comments(
    flat: Vec<RedditComment>,
    limits: CommentLimits,
    window: TimeWindow,
) -> Vec<RedditComment> {
    let mut ranked: Vec<RedditComment> = flat.into_iter().take(limits.initial_fetch).collect();
    ranked.sort_by_key(|comment| Reverse(comment.rank_score()));
    ranked.truncate(limits.keep);
    ranked
        .into_iter()
        .filter(|comment| matches!(comment.created_utc, Some(ts) if window.contains(ts)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: TimeWindow = TimeWindow {
        start: 1_000,
        end: 2_000,
    };

    fn comment(id: &str, score: Option<i64>, created: Option<i64>) -> RedditComment {
        RedditComment {
            id: id.to_string(),
            parent_id: "t3_p".to_string(),
            body: Some(format!("body {}", id)),
            score,
            created_utc: created,
        }
    }

    fn ids(comments: &[RedditComment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_ranking_is_stable_and_missing_score_is_zero() {
        let flat = vec![
            comment("a", Some(5), Some(1_500)),
            comment("b", None, Some(1_500)),
            comment("c", Some(5), Some(1_500)),
            comment("d", Some(3), Some(1_500)),
        ];
        let limits = CommentLimits {
            initial_fetch: 50,
            keep: 10,
        };
        assert_eq!(ids(&select_comments(flat, limits, WINDOW)), ["a", "c", "d", "b"]);
    }

    #[test]
    fn test_negative_scores_rank_below_missing() {
        let flat = vec![
            comment("neg", Some(-2), Some(1_500)),
            comment("none", None, Some(1_500)),
        ];
        let limits = CommentLimits {
            initial_fetch: 50,
            keep: 10,
        };
        assert_eq!(ids(&select_comments(flat, limits, WINDOW)), ["none", "neg"]);
    }

    #[test]
    fn test_caps_apply_before_ranking() {
        // Later comments score higher but sit past the fetch cap.
        let flat: Vec<RedditComment> = (0..100)
            .map(|i| comment(&format!("c{}", i), Some(i), Some(1_500)))
            .collect();
        let limits = CommentLimits {
            initial_fetch: 50,
            keep: 10,
        };

        let kept = select_comments(flat, limits, WINDOW);
        assert_eq!(kept.len(), 10);
        assert!(kept.iter().all(|c| c.rank_score() < 50));
        assert_eq!(kept[0].id, "c49");
        assert_eq!(kept[9].id, "c40");
    }

    #[test]
    fn test_keep_cap_above_fetch_cap_is_clamped() {
        let flat: Vec<RedditComment> = (0..20)
            .map(|i| comment(&format!("c{}", i), Some(i), Some(1_500)))
            .collect();
        let limits = CommentLimits {
            initial_fetch: 5,
            keep: 10,
        };

        let kept = select_comments(flat, limits, WINDOW);
        assert_eq!(ids(&kept), ["c4", "c3", "c2", "c1", "c0"]);
    }

    #[test]
    fn test_window_filter_runs_after_ranking() {
        let flat = vec![
            comment("old", Some(100), Some(999)),
            comment("start", Some(50), Some(1_000)),
            comment("end", Some(40), Some(2_000)),
            comment("undated", Some(30), None),
            comment("inside", Some(1), Some(1_999)),
        ];
        let limits = CommentLimits {
            initial_fetch: 50,
            keep: 3,
        };
        // Top three are old, start, end; only start is in the window.
        assert_eq!(ids(&select_comments(flat, limits, WINDOW)), ["start"]);
    }
}
