use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the spendly home directory with a default `config.json` and an empty database.
///
/// # Errors
/// - A `Config` error if the directory is already initialized or any file operation fails.
/// - A `Database` error if the database cannot be created.
pub async fn init(spendly_home: &Path) -> Result<Out<()>> {
    let config = Config::create(spendly_home).await?;
    Ok(format!(
        "Created the spendly home directory at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("Created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("spendly.sqlite").is_file());

        let err = init(&home).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
