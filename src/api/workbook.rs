//! Implements the `Sheet` trait over a workbook directory holding one CSV file per sheet.
//!
//! Every write rewrites the whole CSV file through a temporary file and a rename, so a sheet file
//! is never left half-written.

use crate::api::{check_coordinates, set_cell, Sheet, WriteError};
use crate::model::{BUDGET, BUDGET_HEADERS, EXPENSES, INCOME, LEDGER_HEADERS};
use crate::{utils, Result};
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{debug, trace};

const EXTENSION: &str = "csv";

/// A `Sheet` stored as `{dir}/{sheet_name}.csv` files.
#[derive(Debug, Clone)]
pub(crate) struct WorkbookSheet {
    dir: PathBuf,
}

impl WorkbookSheet {
    /// Opens an existing workbook directory.
    pub(crate) async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            bail!(
                "The workbook directory '{}' is missing, run 'fintrack init' to create it",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    /// Creates the workbook directory and any of the three sheets that do not exist yet, each with
    /// only its header row. Existing sheet files are left alone.
    pub(crate) async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        utils::make_dir(&dir).await?;
        let workbook = Self { dir };
        let sheets: [(&str, &[&str]); 3] = [
            (EXPENSES, &LEDGER_HEADERS[..]),
            (INCOME, &LEDGER_HEADERS[..]),
            (BUDGET, &BUDGET_HEADERS[..]),
        ];
        for (name, headers) in sheets {
            let path = workbook.path(name);
            if path.is_file() {
                debug!("Keeping the existing sheet {}", path.display());
                continue;
            }
            let header_row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            workbook.save(name, &[header_row]).await?;
        }
        Ok(workbook)
    }

    fn path(&self, sheet_name: &str) -> PathBuf {
        self.dir.join(format!("{sheet_name}.{EXTENSION}"))
    }

    async fn load(&self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        let path = self.path(sheet_name);
        if !path.is_file() {
            bail!("Sheet '{sheet_name}' not found at {}", path.display());
        }
        let content = utils::read(&path).await?;
        parse_csv(content.as_bytes())
            .with_context(|| format!("Unable to parse the '{sheet_name}' sheet"))
    }

    async fn save(&self, sheet_name: &str, rows: &[Vec<String>]) -> Result<()> {
        let path = self.path(sheet_name);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        let bytes = write_csv(rows)?;
        utils::write(&tmp, bytes).await?;
        utils::rename(&tmp, &path).await
    }

    /// Runs a read-modify-write of `sheet_name`, reporting any failure as a `WriteError`.
    async fn modify<F>(&self, sheet_name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Vec<String>>) + Send,
    {
        let result = async {
            let mut rows = self.load(sheet_name).await?;
            f(&mut rows);
            self.save(sheet_name, &rows).await
        }
        .await;
        result.map_err(|e| WriteError::new(sheet_name, format!("{e:#}")).into())
    }
}

#[async_trait::async_trait]
impl Sheet for WorkbookSheet {
    async fn read_all(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        trace!("read_all for {sheet_name}");
        self.load(sheet_name).await
    }

    async fn append_row(&mut self, sheet_name: &str, row: &[String]) -> Result<()> {
        trace!("append_row for {sheet_name}: {row:?}");
        let row = row.to_vec();
        self.modify(sheet_name, move |rows| rows.push(row)).await
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
        let value = value.to_string();
        self.modify(sheet_name, move |rows| set_cell(rows, row, column, &value))
            .await
    }
}

/// Loads rows from CSV-formatted bytes. No row is treated as a header and rows may differ in
/// length.
pub(crate) fn parse_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

fn write_csv(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish writing CSV data: {e}"))
}
