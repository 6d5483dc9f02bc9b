use futures::StreamExt;
use reddit_client::RedditClient;
use trends_core::{ForumClient, RedditCredentials};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let subreddit = std::env::args().nth(1).unwrap_or_else(|| "rust".to_string());
    let credentials = RedditCredentials::from_env()?;

    println!("=== Newest posts in r/{} ===\n", subreddit);
    let client = RedditClient::connect(credentials).await?;

    let mut posts = client.newest(&subreddit, 5);
    while let Some(post) = posts.next().await {
        let post = post?;
        let tree = client.comments(&post).await?;
        let placeholders = tree.placeholders();
        let hidden: usize = placeholders.iter().map(|m| m.children.len()).sum();
        let loaded = tree.flatten().len();

        println!("{} [{}] {}", post.id, post.created_utc, post.title);
        println!("    {} comments loaded, {} behind placeholders\n", loaded, hidden);
    }
    drop(posts);

    let metrics = client.get_api_metrics().await;
    println!(
        "{} requests, {} failed, average {:?}",
        metrics.total_requests,
        metrics.failed_requests,
        metrics.average_response_time()
    );
    Ok(())
}
