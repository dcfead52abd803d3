/// A published premium article as listed in a channel sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiumArticle {
    pub slug: String,
    /// Last update, formatted `YYYY-MM-DD`.
    pub lastmod: Option<String>,
}
