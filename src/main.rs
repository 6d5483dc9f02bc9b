use serde_json::json;
use trend_service::{handle, InvocationContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("reddit_trends=info".parse()?)
                .add_directive("trend_service=info".parse()?)
                .add_directive("reddit_client=info".parse()?)
                .add_directive("aws_store=info".parse()?)
                .add_directive("database=info".parse()?)
                .add_directive("trends_core=info".parse()?),
        )
        .init();

    tracing::info!("Starting Reddit trends census");

    // An optional JSON event may be passed as the first argument.
    let event = match std::env::args().nth(1) {
        Some(raw) => serde_json::from_str(&raw)?,
        None => json!({}),
    };
    let context = InvocationContext {
        request_id: format!("local-{}", std::process::id()),
    };

    let result = handle(event, context).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        anyhow::bail!("census run failed");
    }
    Ok(())
}
