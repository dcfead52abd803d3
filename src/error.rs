#[derive(Debug, Clone)]
pub struct AppError {
    pub message: String,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::new(format!("database error: {e}"))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::new(format!("migration error: {e}"))
    }
}

/// Everything that can make a sitemap chunk request fail.
///
/// Callers only ever see the generic failure body; the variant is kept for
/// the error sink and the logs.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("host header missing")]
    MissingHost,

    #[error("sitemap builder failed: {0}")]
    Builder(#[from] AppError),

    #[error("sitemap builder panicked: {0}")]
    BuilderPanicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_error_keeps_cause_in_message() {
        let err = ChunkError::from(AppError::new("channel not found: news"));
        assert_eq!(
            err.to_string(),
            "sitemap builder failed: channel not found: news"
        );
    }

    #[test]
    fn panic_message_is_kept() {
        let err = ChunkError::BuilderPanicked("index out of bounds".to_string());
        assert_eq!(
            err.to_string(),
            "sitemap builder panicked: index out of bounds"
        );
    }

    #[test]
    fn missing_host_message() {
        assert_eq!(ChunkError::MissingHost.to_string(), "host header missing");
    }
}
