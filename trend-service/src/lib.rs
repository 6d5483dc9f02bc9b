//! Daily keyword census over a subreddit: samples yesterday's posts and
//! their top comments, counts keyword mentions, and stores one snapshot
//! per day.

pub mod aggregator;
pub mod handler;
pub mod loader;
pub mod orchestrator;
pub mod sampler;

pub use aggregator::TrendAggregator;
pub use handler::{handle, invoke, InvocationContext, InvocationResult, SUCCESS_BODY};
pub use loader::load_keywords;
pub use orchestrator::{analyze, run_census, CensusReport, Collaborators};
pub use sampler::{in_window_posts, resolve_comments, sample_comments, select_comments, CommentLimits};
