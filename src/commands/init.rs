use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its backups directory, an initial `config.json` with default
/// settings, and the workbook with the expenses, income and budget sheets.
///
/// Running it again is safe: an existing `config.json` and existing sheets are kept.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the fintrack directory and workbook at {}",
        config.workbook().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_twice() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        init(&home).await.unwrap();
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("workbook"));
        assert!(home.join("config.json").is_file());
        assert!(home.join(".backups").is_dir());
    }
}
