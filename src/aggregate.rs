//! Sums ledger amounts, in total and per category.

use crate::model::{Amount, Row, Transaction};
use crate::Result;
use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Summed amounts keyed by the exact category text.
pub type CategoryTotals = BTreeMap<String, Decimal>;

/// The sum of every amount in `ledger`. An empty ledger sums to zero.
///
/// # Errors
/// - Returns an error naming the first row whose amount takes the sum out of `Decimal` range.
pub fn total<'a>(ledger: impl IntoIterator<Item = &'a Transaction>) -> Result<Decimal> {
    ledger
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, txn| add(sum, txn))
}

/// The sum of amounts per category. Categories are compared exactly: `Food` and `food` are
/// different keys, and so are `Food` and `Food ` if a sheet cell has trailing whitespace.
pub fn totals_by_category<'a>(
    ledger: impl IntoIterator<Item = &'a Transaction>,
) -> Result<CategoryTotals> {
    let mut totals = CategoryTotals::new();
    for txn in ledger {
        let sum = totals.entry(txn.category().to_string()).or_default();
        *sum = add(*sum, txn)?;
    }
    Ok(totals)
}

fn add(sum: Decimal, txn: &Transaction) -> Result<Decimal> {
    sum.checked_add(txn.amount().value()).ok_or_else(|| {
        let row = txn
            .sheet_row()
            .map(|r| format!("row {r}"))
            .unwrap_or_else(|| "a new row".to_string());
        anyhow!(
            "The amount {} at {row} makes the total too large to represent",
            txn.amount()
        )
    })
}

/// Ledger-wide income, expenses, and their difference.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetIncome {
    total_income: Decimal,
    total_expenses: Decimal,
    net_income: Decimal,
}

impl NetIncome {
    pub fn new(total_income: Decimal, total_expenses: Decimal) -> Result<Self> {
        let net_income = total_income
            .checked_sub(total_expenses)
            .ok_or_else(|| anyhow!("Net income is too large to represent"))?;
        Ok(Self {
            total_income,
            total_expenses,
            net_income,
        })
    }

    /// Sums both ledgers.
    pub fn from_ledgers(income: &[Transaction], expenses: &[Transaction]) -> Result<Self> {
        Self::new(total(income)?, total(expenses)?)
    }

    pub fn total_income(&self) -> Decimal {
        self.total_income
    }

    pub fn total_expenses(&self) -> Decimal {
        self.total_expenses
    }

    pub fn net_income(&self) -> Decimal {
        self.net_income
    }
}

impl Display for NetIncome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total income: {}, total expenses: {}, net income: {}",
            Amount::currency(self.total_income),
            Amount::currency(self.total_expenses),
            Amount::currency(self.net_income)
        )
    }
}
