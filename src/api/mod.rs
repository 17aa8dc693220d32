//! The store adapter: the `Sheet` trait over the named tables and the backends that implement it.

mod memory;
mod workbook;

use crate::{Config, Result};
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) use memory::MemorySheet;
pub(crate) use workbook::{parse_csv, WorkbookSheet};

/// This environment variable selects the seeded in-memory sheet instead of the workbook on disk.
pub const IN_MEMORY_ENV: &str = "FINTRACK_IN_MEMORY";

/// A row-based, header-first tabular store holding named sheets.
///
/// Row and column indexes in this trait are 1-based, and the header row is row 1, matching what a
/// spreadsheet shows to its user.
#[async_trait::async_trait]
pub trait Sheet: Send {
    /// Every row of `sheet_name`, header row first.
    async fn read_all(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>>;

    /// Every data row of `sheet_name` keyed by header. Cells missing from short rows are empty.
    async fn read_records(&mut self, sheet_name: &str) -> Result<Vec<BTreeMap<String, String>>> {
        let mut rows = self.read_all(sheet_name).await?.into_iter();
        let headers = match rows.next() {
            Some(headers) => headers,
            None => return Ok(Vec::new()),
        };
        Ok(rows
            .map(|row| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(ix, h)| (h.clone(), row.get(ix).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect())
    }

    /// Appends `row` after the last row of `sheet_name`. Fails with a `WriteError`.
    async fn append_row(&mut self, sheet_name: &str, row: &[String]) -> Result<()>;

    /// Sets a single cell of `sheet_name`. Fails with a `WriteError`.
    async fn update_cell(
        &mut self,
        sheet_name: &str,
        row: usize,
        column: usize,
        value: &str,
    ) -> Result<()>;
}

/// The store failed to accept a write. The action that issued the write is abandoned; nothing is
/// retried or rolled back.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("Unable to write to the '{sheet}' sheet: {reason}")]
pub struct WriteError {
    sheet: String,
    reason: String,
}

impl WriteError {
    pub fn new(sheet: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            reason: reason.into(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }
}

/// Which backend to use for the `Sheet`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// The CSV workbook named in the configuration.
    #[default]
    Workbook,
    /// A seeded in-memory sheet; nothing is saved.
    Memory,
}

impl Mode {
    /// When `FINTRACK_IN_MEMORY` is set and non-zero in length the mode is `Mode::Memory`,
    /// otherwise it is `Mode::Workbook`.
    pub fn from_env() -> Self {
        match std::env::var(IN_MEMORY_ENV) {
            Ok(value) if !value.is_empty() => Mode::Memory,
            _ => Mode::Workbook,
        }
    }
}

/// Opens the `Sheet` for `mode`. The handle lives for one command or session.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    debug!("Opening the {mode:?} sheet");
    Ok(match mode {
        Mode::Workbook => Box::new(WorkbookSheet::open(config.workbook()).await?),
        Mode::Memory => Box::new(MemorySheet::default()),
    })
}

/// Returns `Err` when a 1-based sheet coordinate is zero.
pub(crate) fn check_coordinates(sheet_name: &str, row: usize, column: usize) -> Result<()> {
    if row == 0 || column == 0 {
        return Err(WriteError::new(
            sheet_name,
            format!("cell ({row}, {column}) is not a valid 1-based coordinate"),
        )
        .into());
    }
    Ok(())
}

/// Sets `rows[row - 1][column - 1]` to `value`, padding with blank rows and cells as needed.
pub(crate) fn set_cell(rows: &mut Vec<Vec<String>>, row: usize, column: usize, value: &str) {
    if rows.len() < row {
        rows.resize_with(row, Vec::new);
    }
    let cells = &mut rows[row - 1];
    if cells.len() < column {
        cells.resize_with(column, String::new);
    }
    cells[column - 1] = value.to_string();
}
