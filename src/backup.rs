//! Snapshots of sheet data taken before the budget is rewritten.

use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Prefix for budget snapshot files, taken before a reconciliation pass writes any cell.
pub const BUDGET_SNAPSHOT: &str = "budget";

const JSON: &str = "json";

/// Manages backup file creation and rotation.
///
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `data` as a pretty-printed JSON backup file.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json<T>(&self, prefix: &str, data: &T) -> Result<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        utils::make_dir(&self.backups_dir).await?;
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{JSON}"));

        let json = serde_json::to_string_pretty(data)
            .with_context(|| format!("Failed to serialize the {prefix} backup to JSON"))?;
        utils::write(&path, json).await?;

        self.rotate(prefix).await?;
        Ok(path)
    }

    /// The next free sequence number for `prefix` on `date`.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .list(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files = self.list(prefix).await?;

        // Filenames sort by date and then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, name) in files.into_iter().take(to_delete) {
            debug!("Removing old backup {name}");
            utils::remove(&path).await?;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        Ok(files)
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses NNN from `{prefix}.{date}-NNN.json`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{JSON}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{JSON}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("budget.2025-12-14-001.json", "budget", "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("budget.2025-12-14-042.json", "budget", "2025-12-14"),
            Some(42)
        );
        assert_eq!(
            parse_sequence_number("budget.2025-12-13-001.json", "budget", "2025-12-14"),
            None
        );
        assert_eq!(
            parse_sequence_number("budget.2025-12-14-abc.json", "budget", "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("budget.2025-12-14-001.json", "budget"));
        assert!(!is_backup_file("budget.2025-12-14-001.csv", "budget"));
        assert!(!is_backup_file("expenses.2025-12-14-001.json", "budget"));
    }

    #[tokio::test]
    async fn test_save_json_numbers_files() {
        let env = TestEnv::new().await;
        let backup = env.config().backup();
        let first = backup.save_json(BUDGET_SNAPSHOT, &vec![vec!["a"]]).await.unwrap();
        let second = backup.save_json(BUDGET_SNAPSHOT, &vec![vec!["b"]]).await.unwrap();
        let first_name = first.file_name().unwrap().to_string_lossy().to_string();
        let second_name = second.file_name().unwrap().to_string_lossy().to_string();
        assert!(first_name.ends_with("-001.json"), "{first_name}");
        assert!(second_name.ends_with("-002.json"), "{second_name}");
        let content = utils::read(&second).await.unwrap();
        assert!(content.contains("\"b\""));
    }

    #[tokio::test]
    async fn test_rotation_keeps_backup_copies() {
        let env = TestEnv::new().await;
        let backup = env.config().backup();
        let copies = env.config().backup_copies() as usize;
        for ix in 0..copies + 3 {
            backup.save_json(BUDGET_SNAPSHOT, &ix).await.unwrap();
        }
        let remaining = backup.list(BUDGET_SNAPSHOT).await.unwrap();
        assert_eq!(remaining.len(), copies);
        let newest = remaining.iter().map(|(_, n)| n.clone()).max().unwrap();
        assert!(newest.ends_with(&format!("-{:03}.json", copies + 3)));
    }
}
