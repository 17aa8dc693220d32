use crate::api::{self, Mode};
use crate::commands::{reconciler, Out};
use crate::model::LedgerKind;
use crate::reconcile::Reconciliation;
use crate::session::record;
use crate::validate::{parse_line, ValidatedTransaction};
use crate::{Config, Result};
use serde::Serialize;

/// The structured output of `fintrack add`.
#[derive(Debug, Clone, Serialize)]
pub struct Added {
    ledger: LedgerKind,
    transaction: ValidatedTransaction,
    reconciliation: Reconciliation,
}

impl Added {
    pub fn reconciliation(&self) -> &Reconciliation {
        &self.reconciliation
    }
}

/// Validates `line`, appends it to the `kind` ledger, and reconciles the budget.
///
/// Invalid input fails before the sheet is opened.
pub async fn add(config: Config, mode: Mode, kind: LedgerKind, line: &str) -> Result<Out<Added>> {
    let transaction = parse_line(line)?;
    let mut sheet = api::sheet(&config, mode).await?;
    let reconciliation = record(
        sheet.as_mut(),
        &reconciler(&config, mode),
        kind,
        &transaction,
    )
    .await?;
    Ok(Out::new(
        reconciliation.summary(),
        Added {
            ledger: kind,
            transaction,
            reconciliation,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BUDGET, EXPENSES};
    use crate::test::TestEnv;
    use crate::validate::ValidationError;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_add_expense() {
        let env = TestEnv::seeded().await;
        let out = add(
            env.config(),
            Mode::Workbook,
            LedgerKind::Expense,
            "01-03-2024, Food, 8.50, Lunch",
        )
        .await
        .unwrap();
        let added = out.structure().unwrap();
        assert_eq!(
            added.reconciliation().net_income().net_income(),
            Decimal::new(19865, 1)
        );
        assert!(out.message().contains("net income: $1,986.50"));

        let expenses = env.rows(EXPENSES).await;
        assert_eq!(expenses.last().unwrap(), &vec!["01-03-2024", "Food", "8.50", "Lunch"]);
        let budget = env.rows(BUDGET).await;
        assert_eq!(budget[1], vec!["Food", "100", "13.50", "86.50", "1900", "1986.50"]);
    }

    #[tokio::test]
    async fn test_add_backs_up_budget() {
        let env = TestEnv::seeded().await;
        add(env.config(), Mode::Workbook, LedgerKind::Income, "02-03-2024,Gift,50,Birthday")
            .await
            .unwrap();
        let mut dir = tokio::fs::read_dir(env.config().backups()).await.unwrap();
        let entry = dir.next_entry().await.unwrap().unwrap();
        assert!(entry.file_name().to_string_lossy().starts_with("budget."));
    }

    #[tokio::test]
    async fn test_add_invalid_line_writes_nothing() {
        let env = TestEnv::seeded().await;
        let before = env.rows(EXPENSES).await;
        let err = add(
            env.config(),
            Mode::Workbook,
            LedgerKind::Expense,
            "31-02-2024,Food,1,x",
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::DateFormat(_))
        ));
        assert_eq!(env.rows(EXPENSES).await, before);
    }

    #[tokio::test]
    async fn test_add_in_memory() {
        let env = TestEnv::new().await;
        let out = add(
            env.config(),
            Mode::Memory,
            LedgerKind::Expense,
            "16-10-2025,Dining,20,Pizza",
        )
        .await
        .unwrap();
        let totals = out.structure().unwrap().reconciliation().expense_totals();
        assert_eq!(totals["Dining"], Decimal::new(3485, 2));
        // the workbook on disk is untouched
        assert_eq!(env.rows(EXPENSES).await.len(), 1);
    }
}
