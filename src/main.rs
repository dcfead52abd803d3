use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use premium_sitemap::server::api;
use premium_sitemap::server::state::{AppState, StartupOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "premium-sitemap")]
struct Cli {
    /// How long a failing request waits for its error report to flush, in milliseconds
    #[arg(long, default_value_t = 2000)]
    report_flush_timeout_ms: u64,

    /// Do not run the embedded database migrations at start-up
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let site_addr: SocketAddr = std::env::var("SITE_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    let state = AppState::new(&StartupOptions {
        report_flush_timeout: Duration::from_millis(cli.report_flush_timeout_ms),
        run_migrations: !cli.skip_migrations,
    })
    .await?;

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&site_addr).await?;
    tracing::info!("listening on http://{}", &site_addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
