//! Comment trees as returned by the forum, and the two operations the
//! sampler needs on them: grafting one level of expanded placeholders and
//! flattening into a linear sequence.

use crate::types::{CommentNode, MoreComments, RedditComment};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentTree {
    pub roots: Vec<CommentNode>,
}

impl CommentTree {
    pub fn new(roots: Vec<CommentNode>) -> Self {
        Self { roots }
    }

    /// Placeholders that can be expanded. "Continue this thread" stubs carry
    /// no child ids and are left out.
    pub fn placeholders(&self) -> Vec<MoreComments> {
        let mut found = Vec::new();
        let mut queue: VecDeque<&CommentNode> = self.roots.iter().collect();
        while let Some(node) = queue.pop_front() {
            match node {
                CommentNode::Comment { replies, .. } => queue.extend(replies.iter()),
                CommentNode::More(more) if !more.children.is_empty() => found.push(more.clone()),
                CommentNode::More(_) => {}
            }
        }
        found
    }

    /// Replaces every placeholder with the fetched comments that hang off its
    /// parent. Fetched comments replying to each other are nested under one
    /// another; anything that attaches nowhere is dropped.
    pub fn graft(self, fetched: Vec<RedditComment>) -> Self {
        let mut by_parent: HashMap<String, Vec<RedditComment>> = HashMap::new();
        for comment in fetched {
            by_parent
                .entry(comment.parent_id.clone())
                .or_default()
                .push(comment);
        }

        Self {
            roots: graft_level(self.roots, &mut by_parent),
        }
    }

    /// Breadth-first flattening. Remaining placeholders are discarded.
    pub fn flatten(self) -> Vec<RedditComment> {
        let mut flat = Vec::new();
        let mut queue: VecDeque<CommentNode> = self.roots.into();
        while let Some(node) = queue.pop_front() {
            if let CommentNode::Comment { comment, replies } = node {
                flat.push(comment);
                queue.extend(replies);
            }
        }
        flat
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn graft_level(
    nodes: Vec<CommentNode>,
    by_parent: &mut HashMap<String, Vec<RedditComment>>,
) -> Vec<CommentNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            CommentNode::Comment { comment, replies } => out.push(CommentNode::Comment {
                comment,
                replies: graft_level(replies, by_parent),
            }),
            CommentNode::More(more) => out.extend(adopt(&more.parent_id, by_parent)),
        }
    }
    out
}

fn adopt(
    parent: &str,
    by_parent: &mut HashMap<String, Vec<RedditComment>>,
) -> Vec<CommentNode> {
    let Some(children) = by_parent.remove(parent) else {
        return Vec::new();
    };
    children
        .into_iter()
        .map(|comment| {
            let replies = adopt(&comment.fullname(), by_parent);
            CommentNode::Comment { comment, replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: &str) -> RedditComment {
        RedditComment {
            id: id.to_string(),
            parent_id: parent.to_string(),
            body: Some(format!("body {}", id)),
            score: Some(1),
            created_utc: Some(0),
        }
    }

    fn more(id: &str, parent: &str, children: &[&str]) -> CommentNode {
        CommentNode::More(MoreComments {
            id: id.to_string(),
            parent_id: parent.to_string(),
            count: children.len() as u32,
            children: children.iter().map(|c| c.to_string()).collect(),
        })
    }

    fn ids(flat: &[RedditComment]) -> Vec<&str> {
        flat.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_flatten_is_breadth_first() {
        let tree = CommentTree::new(vec![
            CommentNode::Comment {
                comment: comment("a", "t3_p"),
                replies: vec![
                    CommentNode::Comment {
                        comment: comment("a1", "t1_a"),
                        replies: vec![CommentNode::leaf(comment("a1x", "t1_a1"))],
                    },
                    CommentNode::leaf(comment("a2", "t1_a")),
                ],
            },
            CommentNode::leaf(comment("b", "t3_p")),
        ]);

        assert_eq!(ids(&tree.flatten()), vec!["a", "b", "a1", "a2", "a1x"]);
    }

    #[test]
    fn test_flatten_drops_unexpanded_placeholders() {
        let tree = CommentTree::new(vec![
            CommentNode::leaf(comment("a", "t3_p")),
            more("m1", "t3_p", &["x", "y"]),
        ]);
        assert_eq!(ids(&tree.flatten()), vec!["a"]);
    }

    #[test]
    fn test_placeholders_skip_continue_thread_stubs() {
        let tree = CommentTree::new(vec![
            CommentNode::Comment {
                comment: comment("a", "t3_p"),
                replies: vec![more("_", "t1_a", &[])],
            },
            more("m1", "t3_p", &["x"]),
        ]);

        let found = tree.placeholders();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "m1");
    }

    #[test]
    fn test_graft_attaches_fetched_comments_at_placeholder_position() {
        let tree = CommentTree::new(vec![
            CommentNode::leaf(comment("a", "t3_p")),
            more("m1", "t3_p", &["x", "y"]),
            CommentNode::Comment {
                comment: comment("b", "t3_p"),
                replies: vec![more("m2", "t1_b", &["b1"])],
            },
        ]);

        let fetched = vec![
            comment("x", "t3_p"),
            comment("x1", "t1_x"),
            comment("y", "t3_p"),
            comment("b1", "t1_b"),
            comment("orphan", "t1_nowhere"),
        ];

        let grafted = tree.graft(fetched);
        assert!(grafted.placeholders().is_empty());
        assert_eq!(
            ids(&grafted.flatten()),
            vec!["a", "x", "y", "b", "x1", "b1"]
        );
    }
}
