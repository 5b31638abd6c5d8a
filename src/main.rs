/// School CMS server
///
/// Serves the public site API and the admin API, and runs the background
/// feedback cleanup.
use school_cms::{config::ServerConfig, jobs, server, AppContext, CmsResult};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> CmsResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| "school_cms=debug,tower_http=debug".into());
    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    print_banner();

    // Create application context
    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   _____      __                __   ________  ________
  / ___/_____/ /_  ____  ____  / /  / ____/  |/  / ___/
  \__ \/ ___/ __ \/ __ \/ __ \/ /  / /   / /|_/ /\__ \
 ___/ / /__/ / / / /_/ / /_/ / /  / /___/ /  / /___/ /
/____/\___/_/ /_/\____/\____/_/   \____/_/  /_//____/

        School website CMS v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
