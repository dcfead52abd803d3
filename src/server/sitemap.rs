use async_trait::async_trait;
use quick_xml::escape::escape;
use sqlx::PgPool;
use url::Url;

use crate::error::AppError;
use crate::model::article::PremiumArticle;
use crate::server::db;

/// Produces the sitemap document for the premium content of one channel.
#[async_trait]
pub trait SitemapBuilder: Send + Sync {
    /// Returns a complete XML document whose URLs are rooted at `host`.
    async fn create_sitemap_for_premium_by_channel(
        &self,
        host: &str,
        channel_name: &str,
    ) -> Result<String, AppError>;
}

pub struct PgSitemapBuilder {
    pool: PgPool,
}

impl PgSitemapBuilder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SitemapBuilder for PgSitemapBuilder {
    async fn create_sitemap_for_premium_by_channel(
        &self,
        host: &str,
        channel_name: &str,
    ) -> Result<String, AppError> {
        let channel_id = db::find_channel_by_name(&self.pool, channel_name)
            .await?
            .ok_or_else(|| AppError::new(format!("channel not found: {channel_name}")))?;

        let articles =
            db::list_premium_articles_by_channel(&self.pool, channel_id, db::MAX_URLS_PER_CHUNK)
                .await?;

        if articles.len() as i64 >= db::MAX_URLS_PER_CHUNK {
            tracing::warn!(
                channel = channel_name,
                "premium sitemap truncated at {} entries",
                db::MAX_URLS_PER_CHUNK
            );
        }

        render_urlset(host, channel_name, &articles)
    }
}

/// Render a sitemaps.org `urlset` for the given channel articles.
///
/// Channel and slug are percent-encoded as path segments, then XML escaped.
pub fn render_urlset(
    host: &str,
    channel_name: &str,
    articles: &[PremiumArticle],
) -> Result<String, AppError> {
    let base = Url::parse(&format!("https://{host}/"))
        .map_err(|e| AppError::new(format!("invalid host {host:?}: {e}")))?;

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );

    for article in articles {
        let mut loc = base.clone();
        loc.path_segments_mut()
            .map_err(|_| AppError::new(format!("host {host:?} cannot carry a path")))?
            .clear()
            .push("c")
            .push(channel_name)
            .push(&article.slug);
        xml.push_str(&format!("  <url>\n    <loc>{}</loc>\n", escape(loc.as_str())));
        if let Some(lastmod) = &article.lastmod {
            xml.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                escape(lastmod.as_str())
            ));
        }
        xml.push_str("    <priority>0.8</priority>\n  </url>\n");
    }

    xml.push_str("</urlset>");
    Ok(xml)
}
