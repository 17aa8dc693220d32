use crate::model::items::{Row, Table};
use crate::model::Amount;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The rows of one ledger sheet (expenses or income).
pub type Ledger = Table<Transaction>;

/// Which of the two ledgers a transaction belongs to.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    #[default]
    Expense,
    Income,
}

serde_plain::derive_display_from_serialize!(LedgerKind);
serde_plain::derive_fromstr_from_deserialize!(LedgerKind);

impl LedgerKind {
    /// The name of the sheet that holds this ledger.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            LedgerKind::Expense => EXPENSES,
            LedgerKind::Income => INCOME,
        }
    }
}

/// The name of the expenses sheet.
pub const EXPENSES: &str = "expenses";
/// The name of the income sheet.
pub const INCOME: &str = "income";

/// Represents a single row from a ledger sheet.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) date: String,
    pub(crate) category: String,
    pub(crate) amount: Amount,
    pub(crate) description: String,
    pub(crate) other_fields: BTreeMap<String, String>,
    #[serde(skip)]
    pub(crate) sheet_row: Option<usize>,
}

impl Transaction {
    pub fn new(
        date: impl Into<String>,
        category: impl Into<String>,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            category: category.into(),
            amount,
            description: description.into(),
            other_fields: BTreeMap::new(),
            sheet_row: None,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Row for Transaction {
    fn set_with_header(&mut self, header: &str, value: String) -> Result<()> {
        match header {
            DATE_STR => self.date = value,
            CATEGORY_STR => self.category = value,
            AMOUNT_STR => self.amount = Amount::from_str(&value)?,
            DESCRIPTION_STR => self.description = value,
            other => {
                let _ = self.other_fields.insert(other.to_string(), value);
            }
        }
        Ok(())
    }

    fn get_by_header(&self, header: &str) -> String {
        match header {
            DATE_STR => self.date.clone(),
            CATEGORY_STR => self.category.clone(),
            AMOUNT_STR => self.amount.to_string(),
            DESCRIPTION_STR => self.description.clone(),
            other => self.other_fields.get(other).cloned().unwrap_or_default(),
        }
    }

    fn set_sheet_row(&mut self, sheet_row: usize) {
        self.sheet_row = Some(sheet_row);
    }

    fn sheet_row(&self) -> Option<usize> {
        self.sheet_row
    }
}

pub(crate) const DATE_STR: &str = "Date";
pub(crate) const CATEGORY_STR: &str = "Category";
pub(crate) const AMOUNT_STR: &str = "Amount";
pub(crate) const DESCRIPTION_STR: &str = "Description";

/// The header row of a freshly created ledger sheet.
pub const LEDGER_HEADERS: [&str; 4] = [DATE_STR, CATEGORY_STR, AMOUNT_STR, DESCRIPTION_STR];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Header;
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_ledger() {
        let ledger = Ledger::parse(vec![
            vec!["Date", "Category", "Amount", "Description"],
            vec!["01-03-2024", "Food", "5", "Groceries"],
            vec!["", "", "", ""],
            vec!["02-03-2024", "Rent", "$1,200.00", "March"],
        ])
        .unwrap();
        assert_eq!(ledger.data().len(), 2);
        let rent = &ledger.data()[1];
        assert_eq!(rent.category(), "Rent");
        assert_eq!(rent.amount().value(), Decimal::from(1200));
        // the blank row still counts toward sheet numbering
        assert_eq!(rent.sheet_row(), Some(4));
    }

    #[test]
    fn test_parse_ledger_reordered_columns() {
        let ledger = Ledger::parse(vec![
            vec!["Amount", "Description", "Category", "Date", "Note"],
            vec!["-3", "Refund", "Food", "04-03-2024", "partial"],
        ])
        .unwrap();
        let txn = &ledger.data()[0];
        assert_eq!(txn.date(), "04-03-2024");
        assert_eq!(txn.amount().value(), Decimal::from(-3));
        assert_eq!(txn.other_fields.get("Note").unwrap(), "partial");
    }

    #[test]
    fn test_parse_ledger_bad_amount_names_row() {
        let err = Ledger::parse(vec![
            vec!["Date", "Category", "Amount", "Description"],
            vec!["01-03-2024", "Food", "five", "Lunch"],
        ])
        .unwrap_err();
        assert!(format!("{err:#}").contains("row 2"));
    }

    #[test]
    fn test_to_row_follows_headers() {
        let txn = Transaction::new("01-03-2024", "Food", Amount::from_str("8.50").unwrap(), "Lunch");
        let headers: Vec<Header> = ["Description", "Amount", "Date", "Category"]
            .into_iter()
            .map(Header::from)
            .collect();
        assert_eq!(txn.to_row(&headers), vec!["Lunch", "8.50", "01-03-2024", "Food"]);
    }

    #[test]
    fn test_ledger_kind() {
        assert_eq!(LedgerKind::from_str("expense").unwrap(), LedgerKind::Expense);
        assert_eq!(LedgerKind::from_str("income").unwrap(), LedgerKind::Income);
        assert!(LedgerKind::from_str("transfer").is_err());
        assert_eq!(LedgerKind::Expense.sheet_name(), "expenses");
        assert_eq!(LedgerKind::Income.to_string(), "income");
    }
}
