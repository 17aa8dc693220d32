//! Derives the budget sheet's computed columns from the ledgers.
//!
//! The four derived columns (actual amount, surplus/deficit, projected and actual net income) are
//! owned by this module; nothing else writes them. A pass always runs in this order:
//!
//! 1. aggregate both ledgers as they are now, after any append
//! 2. set actual amounts (`reconcile_actuals` or `resync_actuals`)
//! 3. `reconcile_surplus`, which depends on the fresh actual amounts
//! 4. `reconcile_net_income`
//!
//! Blank or unparseable budget cells count as zero (see `parse_or_zero`).

use crate::aggregate::{total, totals_by_category, CategoryTotals, NetIncome};
use crate::api::Sheet;
use crate::backup::{Backup, BUDGET_SNAPSHOT};
use crate::model::{Budget, BudgetLine, Ledger, LedgerKind, Row, BUDGET, LEDGER_HEADERS};
use crate::{Config, Result};
use anyhow::{anyhow, bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How actual amounts are set for budget categories that have no expenses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActualsMode {
    /// Every category is recomputed; a category with no expenses gets zero.
    #[default]
    Full,
    /// Only categories with expenses are touched; others keep their previous actual amount.
    Partial,
}

serde_plain::derive_display_from_serialize!(ActualsMode);
serde_plain::derive_fromstr_from_deserialize!(ActualsMode);

/// Sets the actual amount of every budget line whose category appears in `expense_totals`. Lines
/// for other categories are left as they are, even if stale.
pub fn reconcile_actuals(budget: &mut Budget, expense_totals: &CategoryTotals) {
    for line in budget.lines_mut() {
        if let Some(sum) = expense_totals.get(line.category()) {
            line.set_actual_amount(*sum);
        }
    }
}

/// Sets the actual amount of every budget line, using zero for categories that are not in
/// `expense_totals`.
pub fn resync_actuals(budget: &mut Budget, expense_totals: &CategoryTotals) {
    for line in budget.lines_mut() {
        let sum = expense_totals
            .get(line.category())
            .copied()
            .unwrap_or(Decimal::ZERO);
        line.set_actual_amount(sum);
    }
}

/// `surplus_deficit = budgeted_amount - actual_amount` for every line.
///
/// # Errors
/// - Returns an error naming the budget line whose difference is out of `Decimal` range. Lines
///   before it have already been updated.
pub fn reconcile_surplus(budget: &mut Budget) -> Result<()> {
    for line in budget.lines_mut() {
        let surplus = subtract(line, line.budgeted_amount(), line.actual_amount())?;
        line.set_surplus_deficit(surplus);
    }
    Ok(())
}

/// `projected_net_income = total_income - budgeted_amount` and
/// `actual_net_income = total_income - actual_amount` for every line.
///
/// # Errors
/// - Returns an error naming the budget line whose difference is out of `Decimal` range.
pub fn reconcile_net_income(budget: &mut Budget, total_income: Decimal) -> Result<()> {
    for line in budget.lines_mut() {
        let projected = subtract(line, total_income, line.budgeted_amount())?;
        let actual = subtract(line, total_income, line.actual_amount())?;
        line.set_projected_net_income(projected);
        line.set_actual_net_income(actual);
    }
    Ok(())
}

fn subtract(line: &BudgetLine, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b).ok_or_else(|| {
        anyhow!(
            "The budget line '{}' at row {} has amounts too large to represent",
            line.category(),
            line.sheet_row().unwrap_or_default()
        )
    })
}

/// Applies steps 2 through 4 to `budget` in memory.
pub fn reconcile_budget(
    budget: &mut Budget,
    mode: ActualsMode,
    expense_totals: &CategoryTotals,
    total_income: Decimal,
) -> Result<()> {
    match mode {
        ActualsMode::Full => resync_actuals(budget, expense_totals),
        ActualsMode::Partial => reconcile_actuals(budget, expense_totals),
    }
    reconcile_surplus(budget)?;
    reconcile_net_income(budget, total_income)
}

/// The outcome of one reconciliation pass.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    mode: ActualsMode,
    expense_totals: CategoryTotals,
    /// Expense categories that have no line in the budget sheet.
    unbudgeted: Vec<String>,
    net_income: NetIncome,
    updated_cells: usize,
}

impl Reconciliation {
    pub fn expense_totals(&self) -> &CategoryTotals {
        &self.expense_totals
    }

    pub fn unbudgeted(&self) -> &[String] {
        &self.unbudgeted
    }

    pub fn net_income(&self) -> NetIncome {
        self.net_income
    }

    pub fn updated_cells(&self) -> usize {
        self.updated_cells
    }

    /// A one-line human summary of the pass.
    pub fn summary(&self) -> String {
        let cells = self.updated_cells;
        let mut s = format!(
            "Budget reconciled ({} mode), {cells} cell{} updated. {}",
            self.mode,
            if cells == 1 { "" } else { "s" },
            self.net_income
        );
        if !self.unbudgeted.is_empty() {
            s.push_str(&format!(
                ". Not in the budget: {}",
                self.unbudgeted.join(", ")
            ));
        }
        s
    }
}

/// Runs reconciliation passes against a `Sheet`.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    mode: ActualsMode,
    backup: Option<Backup>,
}

impl Reconciler {
    pub fn new(mode: ActualsMode, backup: Option<Backup>) -> Self {
        Self { mode, backup }
    }

    /// Uses the configured actuals mode and snapshots the budget into the backups directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.actuals(), Some(config.backup()))
    }

    pub fn mode(&self) -> ActualsMode {
        self.mode
    }

    /// Reads both ledgers and the budget, reconciles, and writes every derived cell whose text
    /// changed back to the budget sheet, one cell at a time. A failed write abandons the pass;
    /// cells written before it stay written.
    pub async fn run(&self, sheet: &mut (dyn Sheet + Send)) -> Result<Reconciliation> {
        let expenses = read_ledger(sheet, LedgerKind::Expense).await?;
        let income = read_ledger(sheet, LedgerKind::Income).await?;
        let expense_totals = totals_by_category(expenses.data())
            .context("Unable to sum the 'expenses' sheet")?;
        let net_income = sum_ledgers(&income, &expenses)?;
        debug!("Expense totals: {expense_totals:?}");

        let rows = sheet.read_all(BUDGET).await?;
        let before = Budget::parse(rows.clone()).context("Unable to read the budget sheet")?;
        let mut budget = before.clone();
        reconcile_budget(
            &mut budget,
            self.mode,
            &expense_totals,
            net_income.total_income(),
        )
        .context("Unable to reconcile the budget sheet")?;

        let unbudgeted: Vec<String> = expense_totals
            .keys()
            .filter(|category| budget.line(category).is_none())
            .cloned()
            .collect();
        for category in &unbudgeted {
            warn!("Expenses are recorded under '{category}', which has no budget line");
        }

        let updates = budget.changed_cells(&before);
        if !updates.is_empty() {
            if let Some(backup) = &self.backup {
                let path = backup.save_json(BUDGET_SNAPSHOT, &rows).await?;
                debug!("Saved budget snapshot to {}", path.display());
            }
        }
        for update in &updates {
            sheet
                .update_cell(BUDGET, update.row, update.column, &update.value)
                .await?;
        }
        debug!("Updated {} budget cells", updates.len());

        Ok(Reconciliation {
            mode: self.mode,
            expense_totals,
            unbudgeted,
            net_income,
            updated_cells: updates.len(),
        })
    }
}

/// Reads and parses one ledger sheet.
pub(crate) async fn read_ledger(
    sheet: &mut (dyn Sheet + Send),
    kind: LedgerKind,
) -> Result<Ledger> {
    let name = kind.sheet_name();
    let rows = sheet.read_all(name).await?;
    let ledger =
        Ledger::parse(rows).with_context(|| format!("Unable to read the '{name}' sheet"))?;
    let missing = ledger.mapping().missing(&LEDGER_HEADERS);
    if !missing.is_empty() {
        bail!(
            "The '{name}' sheet is missing the column(s) {}",
            missing.join(", ")
        );
    }
    Ok(ledger)
}

fn sum_ledgers(income: &Ledger, expenses: &Ledger) -> Result<NetIncome> {
    let total_income = total(income.data()).context("Unable to sum the 'income' sheet")?;
    let total_expenses = total(expenses.data()).context("Unable to sum the 'expenses' sheet")?;
    NetIncome::new(total_income, total_expenses)
}

/// Reads both ledgers and sums them without touching the budget.
pub(crate) async fn net_income(sheet: &mut (dyn Sheet + Send)) -> Result<NetIncome> {
    let expenses = read_ledger(sheet, LedgerKind::Expense).await?;
    let income = read_ledger(sheet, LedgerKind::Income).await?;
    sum_ledgers(&income, &expenses)
}
