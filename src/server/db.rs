use sqlx::PgPool;
use uuid::Uuid;

use crate::model::article::PremiumArticle;

/// A single sitemap file may not list more URLs than this.
pub const MAX_URLS_PER_CHUNK: i64 = 50_000;

pub async fn find_channel_by_name(pool: &PgPool, name: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM channels WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.0))
}

pub async fn list_premium_articles_by_channel(
    pool: &PgPool,
    channel_id: Uuid,
    limit: i64,
) -> Result<Vec<PremiumArticle>, sqlx::Error> {
    let rows: Vec<(String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT slug, to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')
        FROM articles
        WHERE channel_id = $1 AND is_premium AND published_at IS NOT NULL
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(channel_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(slug, lastmod)| PremiumArticle { slug, lastmod })
        .collect())
}
