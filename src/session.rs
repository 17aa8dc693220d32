//! The interactive loop: record transactions and reconcile the budget until the user quits.
//!
//! Validation errors re-prompt. Any other failure (a rejected write, an unreadable sheet) is
//! printed and abandons only the action in progress; the loop continues.

use crate::api::Sheet;
use crate::console::Console;
use crate::model::{LedgerKind, Row, LEDGER_HEADERS};
use crate::reconcile::{read_ledger, Reconciler, Reconciliation};
use crate::validate::{parse_line, ValidatedTransaction, LINE_FORMAT};
use crate::Result;
use anyhow::bail;
use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, info, warn};

const MENU: &str = "Enter a command: add, update budget, quit";

/// The commands accepted at the main prompt.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Action {
    Add,
    UpdateBudget,
    Quit,
}

impl Action {
    fn parse(input: &str) -> Option<Self> {
        let words: Vec<String> = input
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["add"] => Some(Action::Add),
            ["update", "budget"] => Some(Action::UpdateBudget),
            ["quit"] | ["exit"] => Some(Action::Quit),
            _ => None,
        }
    }
}

/// What happened during a session.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct SessionSummary {
    transactions_added: usize,
    reconciliations: usize,
    failed_actions: usize,
}

impl SessionSummary {
    pub fn transactions_added(&self) -> usize {
        self.transactions_added
    }

    pub fn reconciliations(&self) -> usize {
        self.reconciliations
    }

    pub fn failed_actions(&self) -> usize {
        self.failed_actions
    }
}

/// One interactive session against a sheet.
pub struct Session<'a> {
    sheet: &'a mut (dyn Sheet + Send),
    console: &'a mut (dyn Console + Send),
    reconciler: Reconciler,
    summary: SessionSummary,
}

impl<'a> Session<'a> {
    pub fn new(
        sheet: &'a mut (dyn Sheet + Send),
        console: &'a mut (dyn Console + Send),
        reconciler: Reconciler,
    ) -> Self {
        Self {
            sheet,
            console,
            reconciler,
            summary: SessionSummary::default(),
        }
    }

    /// Runs until the user quits or input ends. Only console failures end the session with an
    /// error.
    pub async fn run(mut self) -> Result<SessionSummary> {
        loop {
            self.console.write_line(MENU).await?;
            let Some(input) = self.console.read_line().await? else {
                debug!("End of input, ending the session");
                break;
            };
            if input.trim().is_empty() {
                continue;
            }
            let result = match Action::parse(&input) {
                Some(Action::Add) => self.add().await,
                Some(Action::UpdateBudget) => self.update_budget().await,
                Some(Action::Quit) => break,
                None => {
                    let msg = format!("Unknown command '{}'", input.trim());
                    self.console.write_line(&msg).await?;
                    continue;
                }
            };
            if let Err(e) = result {
                warn!("Action abandoned: {e:#}");
                self.summary.failed_actions += 1;
                self.console.write_line(&format!("Error: {e:#}")).await?;
            }
        }
        self.console.write_line("Goodbye").await?;
        Ok(self.summary)
    }

    async fn add(&mut self) -> Result<()> {
        let Some(kind) = self.prompt_kind().await? else {
            return self.console.write_line("Cancelled").await;
        };
        let Some(txn) = self.prompt_transaction().await? else {
            return self.console.write_line("Cancelled").await;
        };
        let reconciliation = record(self.sheet, &self.reconciler, kind, &txn).await?;
        self.summary.transactions_added += 1;
        self.summary.reconciliations += 1;
        self.console
            .write_line(&format!("Added {kind}: {}", describe(&txn)))
            .await?;
        self.console.write_line(&reconciliation.summary()).await
    }

    async fn update_budget(&mut self) -> Result<()> {
        let reconciliation = self.reconciler.run(self.sheet).await?;
        self.summary.reconciliations += 1;
        self.console.write_line(&reconciliation.summary()).await
    }

    /// Asks for the ledger until the answer is valid. `None` when the user enters nothing.
    async fn prompt_kind(&mut self) -> Result<Option<LedgerKind>> {
        loop {
            self.console.write_line("Expense or income?").await?;
            let Some(input) = self.console.read_line().await? else {
                return Ok(None);
            };
            let input = input.trim().to_lowercase();
            if input.is_empty() {
                return Ok(None);
            }
            match LedgerKind::from_str(&input) {
                Ok(kind) => return Ok(Some(kind)),
                Err(_) => {
                    self.console
                        .write_line(&format!("'{input}' is neither expense nor income"))
                        .await?
                }
            }
        }
    }

    /// Asks for a transaction line until it validates. `None` when the user enters nothing.
    async fn prompt_transaction(&mut self) -> Result<Option<ValidatedTransaction>> {
        loop {
            self.console.write_line(LINE_FORMAT).await?;
            let Some(input) = self.console.read_line().await? else {
                return Ok(None);
            };
            if input.trim().is_empty() {
                return Ok(None);
            }
            match parse_line(&input) {
                Ok(txn) => return Ok(Some(txn)),
                Err(e) => {
                    debug!("Rejected input '{input}': {e}");
                    self.console.write_line(&e.to_string()).await?
                }
            }
        }
    }
}

/// Appends `txn` to the `kind` ledger, then runs a reconciliation pass.
///
/// When the append succeeds but the pass fails, the transaction stays recorded and the budget is
/// stale until the next successful pass.
pub async fn record(
    sheet: &mut (dyn Sheet + Send),
    reconciler: &Reconciler,
    kind: LedgerKind,
    txn: &ValidatedTransaction,
) -> Result<Reconciliation> {
    append(sheet, kind, txn).await?;
    info!("Recorded {kind}: {}", describe(txn));
    reconciler.run(sheet).await
}

/// Appends `txn` to the `kind` ledger with its cells in the sheet's own column order.
pub async fn append(
    sheet: &mut (dyn Sheet + Send),
    kind: LedgerKind,
    txn: &ValidatedTransaction,
) -> Result<()> {
    let ledger = read_ledger(sheet, kind).await?;
    let missing = ledger.mapping().missing(&LEDGER_HEADERS);
    if !missing.is_empty() {
        bail!(
            "The '{}' sheet is missing the column(s) {}",
            kind.sheet_name(),
            missing.join(", ")
        );
    }
    let row = txn.to_transaction().to_row(ledger.mapping().headers());
    sheet.append_row(kind.sheet_name(), &row).await
}

fn describe(txn: &ValidatedTransaction) -> String {
    format!(
        "{}, {}, {}, {}",
        txn.date_text(),
        txn.category(),
        txn.amount(),
        txn.description()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemorySheet;
    use crate::console::ScriptedConsole;
    use crate::model::{BUDGET, BUDGET_HEADERS, EXPENSES, INCOME};
    use crate::reconcile::ActualsMode;
    use std::collections::HashMap;

    fn to_rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    /// A sheet with one expense (Food 5), a salary of 2000 and a Food budget of 100.
    fn food_sheet() -> MemorySheet {
        let data: HashMap<String, Vec<Vec<String>>> = [
            (
                EXPENSES.to_string(),
                to_rows(&[&LEDGER_HEADERS, &["29-02-2024", "Food", "5", "Snack"]]),
            ),
            (
                INCOME.to_string(),
                to_rows(&[&LEDGER_HEADERS, &["01-03-2024", "Salary", "2000", "March"]]),
            ),
            (
                BUDGET.to_string(),
                to_rows(&[&BUDGET_HEADERS, &["Food", "100", "", "", "", ""]]),
            ),
        ]
        .into_iter()
        .collect();
        MemorySheet::new(data)
    }

    async fn run(sheet: &mut MemorySheet, input: &[&str]) -> (SessionSummary, ScriptedConsole) {
        let mut console = ScriptedConsole::new(input.iter().copied());
        let reconciler = Reconciler::new(ActualsMode::Full, None);
        let summary = Session::new(sheet, &mut console, reconciler)
            .run()
            .await
            .unwrap();
        (summary, console)
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::parse("add"), Some(Action::Add));
        assert_eq!(Action::parse(" Update  Budget "), Some(Action::UpdateBudget));
        assert_eq!(Action::parse("QUIT"), Some(Action::Quit));
        assert_eq!(Action::parse("update"), None);
        assert_eq!(Action::parse("delete"), None);
    }

    #[tokio::test]
    async fn test_add_expense_reconciles() {
        let mut sheet = food_sheet();
        let (summary, console) = run(
            &mut sheet,
            &["add", "expense", "01-03-2024, Food, 8.50, Lunch", "quit"],
        )
        .await;
        assert_eq!(summary.transactions_added(), 1);
        assert_eq!(summary.reconciliations(), 1);

        let expenses = sheet.rows(EXPENSES);
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses[2], vec!["01-03-2024", "Food", "8.50", "Lunch"]);
        let budget = sheet.rows(BUDGET);
        assert_eq!(budget[1][2], "13.50");
        assert_eq!(budget[1][3], "86.50");
        assert!(console.printed("net income: $1,986.50"));
        assert_eq!(console.output().last().unwrap(), "Goodbye");
    }

    #[tokio::test]
    async fn test_add_income() {
        let mut sheet = food_sheet();
        let (summary, console) = run(
            &mut sheet,
            &["add", "Income", "15-03-2024,Bonus,500,Q1"],
        )
        .await;
        assert_eq!(summary.transactions_added(), 1);
        assert_eq!(sheet.rows(INCOME).len(), 3);
        assert!(console.printed("Total income: $2,500.00"));
    }

    #[tokio::test]
    async fn test_invalid_lines_reprompt() {
        let mut sheet = food_sheet();
        let (summary, console) = run(
            &mut sheet,
            &[
                "add",
                "expense",
                "31-02-2024,Food,8,Lunch",
                "01-03-2024,Food,eight,Lunch",
                "01-03-2024,Food,8",
                "01-03-2024,Food,8,Lunch",
                "quit",
            ],
        )
        .await;
        assert_eq!(summary.transactions_added(), 1);
        assert_eq!(sheet.rows(EXPENSES).len(), 3);
        assert!(console.printed("'31-02-2024' is not a real date"));
        assert!(console.printed("amount 'eight' must be a valid number"));
        assert!(console.printed("exactly 4 values are required, but 3 were given"));
    }

    #[tokio::test]
    async fn test_empty_line_cancels_add() {
        let mut sheet = food_sheet();
        let (summary, console) = run(&mut sheet, &["add", "expense", "", "quit"]).await;
        assert_eq!(summary.transactions_added(), 0);
        assert_eq!(sheet.rows(EXPENSES).len(), 2);
        assert!(console.printed("Cancelled"));
    }

    #[tokio::test]
    async fn test_unknown_ledger_reprompts() {
        let mut sheet = food_sheet();
        let (summary, console) = run(
            &mut sheet,
            &["add", "transfer", "expense", "01-03-2024,Food,1,x", "quit"],
        )
        .await;
        assert_eq!(summary.transactions_added(), 1);
        assert!(console.printed("'transfer' is neither expense nor income"));
    }

    #[tokio::test]
    async fn test_update_budget() {
        let mut sheet = food_sheet();
        let (summary, console) = run(&mut sheet, &["update budget", "quit"]).await;
        assert_eq!(summary.reconciliations(), 1);
        assert_eq!(sheet.rows(BUDGET)[1], vec!["Food", "100", "5", "95", "1900", "1995"]);
        assert!(console.printed("4 cells updated"));
    }

    #[tokio::test]
    async fn test_end_of_input_quits() {
        let mut sheet = food_sheet();
        let (summary, console) = run(&mut sheet, &["add", "expense"]).await;
        assert_eq!(summary, SessionSummary::default());
        assert_eq!(console.output().last().unwrap(), "Goodbye");
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut sheet = food_sheet();
        let (_, console) = run(&mut sheet, &["delete", "", "quit"]).await;
        assert!(console.printed("Unknown command 'delete'"));
    }

    #[tokio::test]
    async fn test_write_error_abandons_action_only() {
        let mut sheet = food_sheet();
        sheet.reject_writes(true);
        let (summary, console) = run(
            &mut sheet,
            &["add", "expense", "01-03-2024,Food,8,Lunch", "update budget", "quit"],
        )
        .await;
        assert_eq!(summary.transactions_added(), 0);
        assert_eq!(summary.failed_actions(), 2);
        assert!(console.printed("Error: Unable to write to the 'expenses' sheet"));
        assert!(console.printed("Error: Unable to write to the 'budget' sheet"));
        assert_eq!(console.output().last().unwrap(), "Goodbye");
    }

    #[tokio::test]
    async fn test_append_follows_sheet_column_order() {
        let data: HashMap<String, Vec<Vec<String>>> = [(
            EXPENSES.to_string(),
            to_rows(&[&["Amount", "Date", "Notes", "Category", "Description"]]),
        )]
        .into_iter()
        .collect();
        let mut sheet = MemorySheet::new(data);
        let txn = parse_line("01-03-2024,Food,8,Lunch").unwrap();
        append(&mut sheet, LedgerKind::Expense, &txn).await.unwrap();
        assert_eq!(sheet.rows(EXPENSES)[1], vec!["8", "01-03-2024", "", "Food", "Lunch"]);
    }

    #[tokio::test]
    async fn test_append_requires_ledger_columns() {
        let data: HashMap<String, Vec<Vec<String>>> = [(
            EXPENSES.to_string(),
            to_rows(&[&["Date", "Category"]]),
        )]
        .into_iter()
        .collect();
        let mut sheet = MemorySheet::new(data);
        let txn = parse_line("01-03-2024,Food,8,Lunch").unwrap();
        let err = append(&mut sheet, LedgerKind::Expense, &txn).await.unwrap_err();
        assert!(err.to_string().contains("Amount, Description"));
    }
}
