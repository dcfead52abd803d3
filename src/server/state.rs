use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use crate::error::AppError;
use crate::server::api::SitemapChunkHandler;
use crate::server::report::TracingSink;
use crate::server::sitemap::PgSitemapBuilder;

/// Start-up knobs that come from the command line.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub report_flush_timeout: Duration,
    pub run_migrations: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub chunk_handler: SitemapChunkHandler,
}

impl AppState {
    pub async fn new(options: &StartupOptions) -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::new("DATABASE_URL must be set"))?;
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|e| AppError::new(format!("invalid DATABASE_MAX_CONNECTIONS: {e}")))?,
            Err(_) => 10,
        };

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&database_url)
            .await?;

        if options.run_migrations {
            sqlx::migrate!().run(&pool).await?;
        } else {
            tracing::info!("skipping database migrations");
        }

        let chunk_handler = SitemapChunkHandler::new(
            Arc::new(PgSitemapBuilder::new(pool)),
            Arc::new(TracingSink::spawn()),
        )
        .with_flush_timeout(options.report_flush_timeout);

        Ok(Self { chunk_handler })
    }

    pub fn with_handler(chunk_handler: SitemapChunkHandler) -> Self {
        Self { chunk_handler }
    }
}
