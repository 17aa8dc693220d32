use crate::model::amount::parse_or_zero;
use crate::model::items::{Row, Table};
use crate::model::{Amount, Mapping};
use crate::Result;
use anyhow::bail;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// The name of the budget sheet.
pub const BUDGET: &str = "budget";

/// The rows of the budget sheet. Category text is unique and every required column is present.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Budget {
    table: Table<BudgetLine>,
}

impl Budget {
    /// Parses the rows of the budget sheet (header row first). Rows with a blank category are
    /// skipped.
    pub fn parse<S, RowIter, Rows>(sheet_data: Rows) -> Result<Self>
    where
        S: Into<String>,
        RowIter: IntoIterator<Item = S>,
        Rows: IntoIterator<Item = RowIter>,
    {
        let table = Table::<BudgetLine>::parse(sheet_data)?;

        let missing = table.mapping().missing(&BUDGET_HEADERS);
        if !missing.is_empty() {
            bail!(
                "The budget sheet is missing the column(s) {}",
                missing.join(", ")
            );
        }

        let mut seen = HashSet::new();
        for line in table.data() {
            if line.has_category() && !seen.insert(line.category.as_str()) {
                bail!(
                    "The category '{}' appears more than once in the budget sheet",
                    line.category
                );
            }
        }

        Ok(Self { table })
    }

    /// All budget lines that have a category, in sheet order.
    pub fn lines(&self) -> impl Iterator<Item = &BudgetLine> {
        self.table.data().iter().filter(|l| l.has_category())
    }

    pub(crate) fn lines_mut(&mut self) -> impl Iterator<Item = &mut BudgetLine> {
        self.table
            .data_mut()
            .iter_mut()
            .filter(|l| l.has_category())
    }

    pub fn line(&self, category: &str) -> Option<&BudgetLine> {
        self.lines().find(|l| l.category == category)
    }

    pub fn mapping(&self) -> &Mapping {
        self.table.mapping()
    }

    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.table.to_rows()
    }

    /// The cells of derived columns whose text differs between `self` and `before`, as
    /// `(sheet_row, sheet_column, new_text)` with 1-based indexes. Both budgets must come from the
    /// same sheet read.
    pub fn changed_cells(&self, before: &Budget) -> Vec<CellUpdate> {
        let mut updates = Vec::new();
        for (now, then) in self.table.data().iter().zip(before.table.data()) {
            let Some(row) = now.sheet_row() else {
                continue;
            };
            for header in DERIVED_HEADERS {
                let new_text = now.get_by_header(header);
                if new_text == then.get_by_header(header) {
                    continue;
                }
                // Required columns are checked in `parse`, so the lookup cannot miss.
                if let Some(col_ix) = self.mapping().header_index(header) {
                    updates.push(CellUpdate {
                        row,
                        column: col_ix + 1,
                        value: new_text,
                    });
                }
            }
        }
        updates
    }
}

/// One derived cell to write back to the budget sheet. Indexes are 1-based.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

/// Represents a single row from the budget sheet.
///
/// Numeric cells are held as the text that was read so that a blank or hand-edited cell survives
/// untouched until the reconciler overwrites it. The numeric accessors apply `parse_or_zero`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetLine {
    pub(crate) category: String,
    pub(crate) budgeted_amount: String,
    pub(crate) actual_amount: String,
    pub(crate) surplus_deficit: String,
    pub(crate) projected_net_income: String,
    pub(crate) actual_net_income: String,
    pub(crate) other_fields: BTreeMap<String, String>,
    #[serde(skip)]
    pub(crate) sheet_row: Option<usize>,
}

impl BudgetLine {
    pub fn new(category: impl Into<String>, budgeted_amount: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            budgeted_amount: budgeted_amount.into(),
            ..Default::default()
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn budgeted_amount(&self) -> Decimal {
        parse_or_zero(&self.budgeted_amount)
    }

    pub fn actual_amount(&self) -> Decimal {
        parse_or_zero(&self.actual_amount)
    }

    pub fn surplus_deficit(&self) -> Decimal {
        parse_or_zero(&self.surplus_deficit)
    }

    pub fn projected_net_income(&self) -> Decimal {
        parse_or_zero(&self.projected_net_income)
    }

    pub fn actual_net_income(&self) -> Decimal {
        parse_or_zero(&self.actual_net_income)
    }

    /// A whitespace-only category marks a blank line; any other text is kept exactly as stored.
    fn has_category(&self) -> bool {
        !self.category.trim().is_empty()
    }

    pub(crate) fn set_actual_amount(&mut self, value: Decimal) {
        self.actual_amount = Amount::plain(value).to_string();
    }

    pub(crate) fn set_surplus_deficit(&mut self, value: Decimal) {
        self.surplus_deficit = Amount::plain(value).to_string();
    }

    pub(crate) fn set_projected_net_income(&mut self, value: Decimal) {
        self.projected_net_income = Amount::plain(value).to_string();
    }

    pub(crate) fn set_actual_net_income(&mut self, value: Decimal) {
        self.actual_net_income = Amount::plain(value).to_string();
    }
}

impl Row for BudgetLine {
    fn set_with_header(&mut self, header: &str, value: String) -> Result<()> {
        match header {
            CATEGORY_STR => self.category = value,
            BUDGETED_AMOUNT_STR => self.budgeted_amount = value,
            ACTUAL_AMOUNT_STR => self.actual_amount = value,
            SURPLUS_DEFICIT_STR => self.surplus_deficit = value,
            PROJECTED_NET_INCOME_STR => self.projected_net_income = value,
            ACTUAL_NET_INCOME_STR => self.actual_net_income = value,
            other => {
                let _ = self.other_fields.insert(other.to_string(), value);
            }
        }
        Ok(())
    }

    fn get_by_header(&self, header: &str) -> String {
        match header {
            CATEGORY_STR => self.category.clone(),
            BUDGETED_AMOUNT_STR => self.budgeted_amount.clone(),
            ACTUAL_AMOUNT_STR => self.actual_amount.clone(),
            SURPLUS_DEFICIT_STR => self.surplus_deficit.clone(),
            PROJECTED_NET_INCOME_STR => self.projected_net_income.clone(),
            ACTUAL_NET_INCOME_STR => self.actual_net_income.clone(),
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

pub(crate) const CATEGORY_STR: &str = "Category";
pub(crate) const BUDGETED_AMOUNT_STR: &str = "Budgeted Amount";
pub(crate) const ACTUAL_AMOUNT_STR: &str = "Actual Amount";
pub(crate) const SURPLUS_DEFICIT_STR: &str = "Surplus/Deficit";
pub(crate) const PROJECTED_NET_INCOME_STR: &str = "Projected Net Income";
pub(crate) const ACTUAL_NET_INCOME_STR: &str = "Actual Net Income";

/// The header row of a freshly created budget sheet. All of these must be present.
pub const BUDGET_HEADERS: [&str; 6] = [
    CATEGORY_STR,
    BUDGETED_AMOUNT_STR,
    ACTUAL_AMOUNT_STR,
    SURPLUS_DEFICIT_STR,
    PROJECTED_NET_INCOME_STR,
    ACTUAL_NET_INCOME_STR,
];

/// The columns owned by the reconciler.
const DERIVED_HEADERS: [&str; 4] = [
    ACTUAL_AMOUNT_STR,
    SURPLUS_DEFICIT_STR,
    PROJECTED_NET_INCOME_STR,
    ACTUAL_NET_INCOME_STR,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn header() -> Vec<&'static str> {
        BUDGET_HEADERS.to_vec()
    }

    #[test]
    fn test_parse_budget() {
        let budget = Budget::parse(vec![
            header(),
            vec!["Food", "100", "", "", "", ""],
            vec!["Rent", "$1,000.00", "1000", "0", "", ""],
        ])
        .unwrap();
        let food = budget.line("Food").unwrap();
        assert_eq!(food.budgeted_amount(), Decimal::from(100));
        assert_eq!(food.actual_amount(), Decimal::ZERO);
        assert_eq!(food.sheet_row(), Some(2));
        let rent = budget.line("Rent").unwrap();
        assert_eq!(rent.budgeted_amount(), Decimal::from(1000));
        assert_eq!(rent.sheet_row(), Some(3));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let budget = Budget::parse(vec![header(), vec!["Food", "100"]]).unwrap();
        assert_eq!(budget.line("Food").unwrap().surplus_deficit(), Decimal::ZERO);
    }

    #[test]
    fn test_missing_column() {
        let err = Budget::parse(vec![
            vec!["Category", "Budgeted Amount", "Actual Amount"],
            vec!["Food", "100", ""],
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Surplus/Deficit"));
    }

    #[test]
    fn test_duplicate_category() {
        let result = Budget::parse(vec![
            header(),
            vec!["Food", "100", "", "", "", ""],
            vec!["Food", "50", "", "", "", ""],
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_categories_are_case_sensitive() {
        let budget = Budget::parse(vec![
            header(),
            vec!["Food", "100", "", "", "", ""],
            vec!["food", "50", "", "", "", ""],
        ])
        .unwrap();
        assert_eq!(budget.lines().count(), 2);
    }

    #[test]
    fn test_category_text_is_kept_exactly() {
        let budget = Budget::parse(vec![
            header(),
            vec!["Food ", "100", "", "", "", ""],
            vec![" Food", "50", "", "", "", ""],
            vec!["  ", "10", "", "", "", ""],
        ])
        .unwrap();
        assert_eq!(budget.lines().count(), 2);
        assert!(budget.line("Food").is_none());
        assert_eq!(budget.line("Food ").unwrap().budgeted_amount(), Decimal::from(100));
        assert_eq!(budget.to_rows()[1][0], "Food ");
    }

    #[test]
    fn test_changed_cells() {
        let before = Budget::parse(vec![
            vec![
                "Category",
                "Notes",
                "Budgeted Amount",
                "Actual Amount",
                "Surplus/Deficit",
                "Projected Net Income",
                "Actual Net Income",
            ],
            vec!["Food", "weekly shop", "100", "8", "92", "", ""],
        ])
        .unwrap();
        let mut after = before.clone();
        for line in after.lines_mut() {
            line.set_actual_amount(Decimal::from_str("13.5").unwrap());
            line.set_surplus_deficit(Decimal::from_str("92").unwrap());
        }
        let updates = after.changed_cells(&before);
        assert_eq!(
            updates,
            vec![CellUpdate {
                row: 2,
                column: 4,
                value: "13.5".to_string()
            }]
        );
    }
}
