use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::FutureExt;
use http::{HeaderMap, StatusCode, header};
use tower_http::trace::TraceLayer;

use crate::error::ChunkError;
use crate::server::report::ErrorSink;
use crate::server::sitemap::SitemapBuilder;
use crate::server::state::AppState;

pub const SITEMAP_CHUNK_ROUTE: &str = "/sitemap/c/{channel_name}/chunk.xml";

/// Upper bound on waiting for the error sink before answering with a failure.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_millis(2000);

pub const FAILURE_BODY: &str = "Something went wrong";

/// Outcome of a sitemap chunk request. Exactly one is produced per request.
#[derive(Debug, PartialEq, Eq)]
pub enum ChunkResponse {
    Sitemap(String),
    Failure,
}

impl IntoResponse for ChunkResponse {
    fn into_response(self) -> Response {
        match self {
            ChunkResponse::Sitemap(xml) => {
                ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
            }
            // Bare 500, no content type.
            ChunkResponse::Failure => {
                (StatusCode::INTERNAL_SERVER_ERROR, Body::from(FAILURE_BODY)).into_response()
            }
        }
    }
}

/// Serves one premium sitemap chunk: validates the request, asks the
/// builder for the document and turns every failure into a reported 500.
#[derive(Clone)]
pub struct SitemapChunkHandler {
    builder: Arc<dyn SitemapBuilder>,
    sink: Arc<dyn ErrorSink>,
    flush_timeout: Duration,
}

impl SitemapChunkHandler {
    pub fn new(builder: Arc<dyn SitemapBuilder>, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            builder,
            sink,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }

    pub fn with_flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    pub async fn handle(&self, host: Option<&str>, channel_name: &str) -> ChunkResponse {
        match self.build(host, channel_name).await {
            Ok(xml) => ChunkResponse::Sitemap(xml),
            Err(e) => {
                let event_id = self.sink.capture(&e);

                // The sink may not honour its own bound, so enforce it here too.
                let flushed =
                    tokio::time::timeout(self.flush_timeout, self.sink.flush(self.flush_timeout))
                        .await
                        .unwrap_or(false);
                if !flushed {
                    tracing::warn!(
                        %event_id,
                        timeout_ms = self.flush_timeout.as_millis() as u64,
                        "error report not flushed in time"
                    );
                }

                tracing::error!(
                    %event_id,
                    channel = channel_name,
                    "failed to serve premium sitemap chunk: {e}"
                );
                ChunkResponse::Failure
            }
        }
    }

    async fn build(&self, host: Option<&str>, channel_name: &str) -> Result<String, ChunkError> {
        let host = host
            .filter(|h| !h.is_empty())
            .ok_or(ChunkError::MissingHost)?;

        let built = AssertUnwindSafe(
            self.builder
                .create_sitemap_for_premium_by_channel(host, channel_name),
        )
        .catch_unwind()
        .await
        .map_err(|payload| ChunkError::BuilderPanicked(panic_message(payload.as_ref())))?;

        Ok(built?)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Axum handler for `/sitemap/c/{channel_name}/chunk.xml`
pub async fn sitemap_chunk_handler(
    State(state): State<AppState>,
    Path(channel_name): Path<String>,
    headers: HeaderMap,
) -> ChunkResponse {
    // A host that isn't visible ASCII is treated the same as a missing one.
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    state.chunk_handler.handle(host, &channel_name).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SITEMAP_CHUNK_ROUTE, get(sitemap_chunk_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
