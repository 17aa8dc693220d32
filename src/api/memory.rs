//! Implements the `Sheet` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that the whole app can
//! be run, top-to-bottom, without a workbook on disk (see `FINTRACK_IN_MEMORY`).

use crate::api::{check_coordinates, parse_csv, set_cell, Sheet, WriteError};
use crate::model::{BUDGET, EXPENSES, INCOME};
use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use tracing::trace;

/// An implementation of the `Sheet` trait that holds every sheet in memory and, by default, is
/// seeded with some existing data.
#[derive(Debug, Clone)]
pub(crate) struct MemorySheet {
    data: HashMap<String, Vec<Vec<String>>>,
    reject_writes: bool,
}

impl MemorySheet {
    /// Create a new `MemorySheet` using `data`. The map key is sheet name and the map value is the
    /// rows of the sheet.
    pub(crate) fn new(data: HashMap<String, Vec<Vec<String>>>) -> Self {
        Self {
            data,
            reject_writes: false,
        }
    }

    /// Makes every subsequent write fail with a `WriteError`, as a remote store would when it is
    /// unreachable.
    #[cfg(test)]
    pub(crate) fn reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// The current rows of `sheet_name`, for inspection in tests.
    #[cfg(test)]
    pub(crate) fn rows(&self, sheet_name: &str) -> &[Vec<String>] {
        self.data
            .get(sheet_name)
            .map(|rows| rows.as_slice())
            .unwrap_or_default()
    }

    fn writable(&mut self, sheet_name: &str) -> Result<&mut Vec<Vec<String>>> {
        if self.reject_writes {
            return Err(WriteError::new(sheet_name, "the store rejected the write").into());
        }
        match self.data.get_mut(sheet_name) {
            Some(rows) => Ok(rows),
            None => Err(WriteError::new(sheet_name, "no such sheet").into()),
        }
    }
}

#[async_trait::async_trait]
impl Sheet for MemorySheet {
    async fn read_all(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        trace!("read_all for {sheet_name}");
        self.data
            .get(sheet_name)
            .with_context(|| format!("Sheet '{sheet_name}' not found"))
            .cloned()
    }

    async fn append_row(&mut self, sheet_name: &str, row: &[String]) -> Result<()> {
        trace!("append_row for {sheet_name}: {row:?}");
        self.writable(sheet_name)?.push(row.to_vec());
        Ok(())
    }

    async fn update_cell(
        &mut self,
        sheet_name: &str,
        row: usize,
        column: usize,
        value: &str,
    ) -> Result<()> {
        trace!("update_cell for {sheet_name} ({row}, {column}) = '{value}'");
        check_coordinates(sheet_name, row, column)?;
        set_cell(self.writable(sheet_name)?, row, column, value);
        Ok(())
    }
}

impl Default for MemorySheet {
    /// Loads seed data from this module.
    fn default() -> Self {
        Self::new(default_data())
    }
}

/// Provides the seed data from this module.
fn default_data() -> HashMap<String, Vec<Vec<String>>> {
    [
        (EXPENSES, EXPENSE_DATA),
        (INCOME, INCOME_DATA),
        (BUDGET, BUDGET_DATA),
    ]
    .into_iter()
    .map(|(name, csv)| {
        let rows = parse_csv(csv.as_bytes()).expect("seed data is valid CSV");
        (name.to_string(), rows)
    })
    .collect()
}

/// Seed expense data.
const EXPENSE_DATA: &str = r##"Date,Category,Amount,Description
01-10-2025,Rent,1200.00,October rent
03-10-2025,Groceries,87.43,Whole Foods Market
05-10-2025,Utilities,142.67,PG&E Electric
09-10-2025,Groceries,63.21,Trader Joe's
12-10-2025,Transport,52.30,Shell Gas Station
15-10-2025,Dining,14.85,Chipotle
"##;

/// Seed income data.
const INCOME_DATA: &str = r##"Date,Category,Amount,Description
01-10-2025,Salary,3200.00,October salary
20-10-2025,Freelance,450.00,Website build
"##;

/// Seed budget data.
const BUDGET_DATA: &str = r##"Category,Budgeted Amount,Actual Amount,Surplus/Deficit,Projected Net Income,Actual Net Income
Rent,1200,,,,
Groceries,400,,,,
Utilities,250,,,,
Transport,150,,,,
Dining,100,,,,
Entertainment,,,,,
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_data() {
        let mut sheet = MemorySheet::default();
        for name in [EXPENSES, INCOME, BUDGET] {
            let rows = sheet.read_all(name).await.unwrap();
            assert!(rows.len() > 1, "{name} should be seeded");
        }
    }

    #[test]
    fn test_seed_constants_parse() {
        for csv in [EXPENSE_DATA, INCOME_DATA, BUDGET_DATA] {
            let rows = parse_csv(csv.as_bytes()).unwrap();
            assert!(rows.len() > 1);
            assert!(rows.iter().all(|r| r.len() == rows[0].len()));
        }
    }

    #[tokio::test]
    async fn test_append_and_update() {
        let mut sheet = MemorySheet::default();
        let before = sheet.rows(EXPENSES).len();
        let row: Vec<String> = ["01-11-2025", "Dining", "9.75", "Burger"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sheet.append_row(EXPENSES, &row).await.unwrap();
        assert_eq!(sheet.rows(EXPENSES).len(), before + 1);
        assert_eq!(sheet.rows(EXPENSES).last().unwrap(), &row);

        sheet.update_cell(BUDGET, 2, 3, "1200").await.unwrap();
        assert_eq!(sheet.rows(BUDGET)[1][2], "1200");
    }

    #[tokio::test]
    async fn test_rejected_write() {
        let mut sheet = MemorySheet::default();
        sheet.reject_writes(true);
        let err = sheet
            .update_cell(BUDGET, 2, 3, "1")
            .await
            .unwrap_err();
        let write_error = err.downcast_ref::<WriteError>().unwrap();
        assert_eq!(write_error.sheet(), BUDGET);
    }

    #[tokio::test]
    async fn test_missing_sheet() {
        let mut sheet = MemorySheet::new(HashMap::new());
        assert!(sheet.read_all("nope").await.is_err());
        assert!(sheet.append_row("nope", &[]).await.is_err());
    }
}
