mod cli;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wishlist_notifier::Services;
use wishlist_notifier::types::listing::ListingCreatedEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("failed to initialize logging")?;

    match cli::run() {
        cli::RunOutcome::Exit(code) => std::process::exit(code),
        cli::RunOutcome::Serve(config) => wishlist_notifier::serve(config).await?,
        cli::RunOutcome::Handle(config, path) => {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read event {}", path.display()))?;
            let event: ListingCreatedEvent =
                serde_json::from_str(&contents).context("invalid listing event")?;
            let services = Services::init(&config)?;
            let outcome = services.handle(&event).await?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
    }
    Ok(())
}
