//! Types that represent the sheets of the tracker: the two ledgers of `Transaction` rows and the
//! `Budget` of `BudgetLine` rows.
mod amount;
mod budget;
mod items;
mod mapping;
mod transaction;

pub use amount::{parse_or_zero, Amount, AmountError, AmountFormat};
pub use budget::{Budget, BudgetLine, CellUpdate, BUDGET, BUDGET_HEADERS};
pub use items::{Row, Table};
pub use mapping::{Header, Mapping, MappingError};
pub use transaction::{Ledger, LedgerKind, Transaction, EXPENSES, INCOME, LEDGER_HEADERS};
