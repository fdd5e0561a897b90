use thiserror::Error;

/// Crate-level error for startup and database plumbing. Provider clients
/// keep their own error enums; agents surface failures as structured
/// outcomes rather than errors.
#[derive(Error, Debug)]
pub enum DermachatError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_convert_and_display() {
        let err: DermachatError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DermachatError::Database(_)));
        assert!(err.to_string().starts_with("Database error:"));
    }
}
