//! Checks a line of user input before it is allowed into a ledger.
//!
//! Rules are applied in order and the first failure wins:
//! 1. exactly four fields: date, category, amount, description
//! 2. the date is `DD-MM-YYYY` and a real calendar date
//! 3. the amount is a number with an optional sign and decimal point
//!
//! Category and description are taken as-is once trimmed.

use crate::model::{Amount, Transaction};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::str::FromStr;

/// The number of comma-separated fields in a transaction line.
pub const FIELD_COUNT: usize = 4;

/// The expected shape of a transaction line, for prompting.
pub const LINE_FORMAT: &str = "Date (DD-MM-YYYY), Category, Amount, Description";

/// Why a line of input was rejected. All of these are recoverable by asking the user again.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid data: exactly {FIELD_COUNT} values are required, but {0} were given")]
    Arity(usize),

    #[error("Invalid data: '{0}' is not a real date in DD-MM-YYYY format")]
    DateFormat(String),

    #[error("Invalid data: amount '{0}' must be a valid number")]
    AmountFormat(String),
}

/// A transaction line that passed every rule. The date is proven to be a real calendar date and
/// the amount is numeric.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ValidatedTransaction {
    date: NaiveDate,
    category: String,
    amount: Amount,
    description: String,
}

impl ValidatedTransaction {
    pub fn date(&self) -> NaiveDate {
        self.date
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

    /// The date in the `DD-MM-YYYY` form it is stored in.
    pub fn date_text(&self) -> String {
        format!(
            "{:02}-{:02}-{:04}",
            self.date.day(),
            self.date.month(),
            self.date.year()
        )
    }

    /// Converts to a ledger `Transaction` for appending.
    pub fn to_transaction(&self) -> Transaction {
        Transaction::new(
            self.date_text(),
            self.category.clone(),
            self.amount,
            self.description.clone(),
        )
    }
}

/// Splits one line of input on commas, trims each field, and validates the result.
pub fn parse_line(line: &str) -> Result<ValidatedTransaction, ValidationError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    validate(&fields)
}

/// Validates already-split fields. Surrounding whitespace is trimmed from every field.
pub fn validate<S>(fields: &[S]) -> Result<ValidatedTransaction, ValidationError>
where
    S: AsRef<str>,
{
    let [date, category, amount, description] = fields else {
        return Err(ValidationError::Arity(fields.len()));
    };
    let date = parse_date(date.as_ref().trim())?;
    let amount = parse_amount(amount.as_ref().trim())?;
    Ok(ValidatedTransaction {
        date,
        category: category.as_ref().trim().to_string(),
        amount,
        description: description.as_ref().trim().to_string(),
    })
}

/// Parses fixed-width `DD-MM-YYYY` into a calendar date.
fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    let bad = || ValidationError::DateFormat(s.to_string());
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(ix, b)| match ix {
            2 | 5 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(bad());
    }
    // Every byte is ASCII, so these slices fall on char boundaries.
    let (day, month, year) = (&s[0..2], &s[3..5], &s[6..10]);
    let day: u32 = day.parse().map_err(|_| bad())?;
    let month: u32 = month.parse().map_err(|_| bad())?;
    let year: i32 = year.parse().map_err(|_| bad())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)
}

/// Parses an optionally signed decimal number. Currency symbols, separators, exponents and
/// anything else are rejected.
fn parse_amount(s: &str) -> Result<Amount, ValidationError> {
    let bad = || ValidationError::AmountFormat(s.to_string());
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut digits = 0;
    let mut points = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return Err(bad()),
        }
    }
    if digits == 0 || points > 1 {
        return Err(bad());
    }
    let unsigned = Amount::from_str(unsigned).map_err(|_| bad())?;
    let value = if s.starts_with('-') {
        -unsigned.value()
    } else {
        unsigned.value()
    };
    Ok(Amount::plain(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_valid_line() {
        let txn = parse_line("01-03-2024, Food , 8.50, Lunch").unwrap();
        assert_eq!(txn.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(txn.date_text(), "01-03-2024");
        assert_eq!(txn.category(), "Food");
        assert_eq!(txn.amount().value(), dec("8.50"));
        assert_eq!(txn.amount().to_string(), "8.50");
        assert_eq!(txn.description(), "Lunch");
    }

    #[test]
    fn test_arity() {
        assert_eq!(
            parse_line("01-03-2024,Food,8.50").unwrap_err(),
            ValidationError::Arity(3)
        );
        assert_eq!(
            parse_line("01-03-2024,Food,8.50,Lunch,extra").unwrap_err(),
            ValidationError::Arity(5)
        );
        assert_eq!(
            validate::<&str>(&[]).unwrap_err(),
            ValidationError::Arity(0)
        );
    }

    #[test]
    fn test_arity_is_checked_before_date() {
        assert_eq!(
            parse_line("yesterday,Food").unwrap_err(),
            ValidationError::Arity(2)
        );
    }

    #[test]
    fn test_date_shape() {
        for date in [
            "1-03-2024",
            "01-3-2024",
            "01-03-24",
            "2024-03-01",
            "01/03/2024",
            "0a-03-2024",
            "+1-03-2024",
        ] {
            let err = validate(&[date, "Food", "1", "x"]).unwrap_err();
            assert!(
                matches!(err, ValidationError::DateFormat(_)),
                "{date} should be rejected"
            );
        }
    }

    #[test]
    fn test_date_must_exist() {
        for date in ["31-02-2024", "30-02-2024", "31-04-2024", "01-13-2024", "00-01-2024"] {
            assert_eq!(
                validate(&[date, "Food", "1", "x"]).unwrap_err(),
                ValidationError::DateFormat(date.to_string())
            );
        }
    }

    #[test]
    fn test_leap_day() {
        assert!(parse_line("29-02-2024,Food,1,x").is_ok());
        assert!(parse_line("29-02-2023,Food,1,x").is_err());
    }

    #[test]
    fn test_date_is_checked_before_amount() {
        assert!(matches!(
            parse_line("31-02-2024,Food,lots,x").unwrap_err(),
            ValidationError::DateFormat(_)
        ));
    }

    #[test]
    fn test_amounts() {
        for (text, expected) in [
            ("10", "10"),
            ("-3", "-3"),
            ("+2.5", "2.5"),
            ("0.125", "0.125"),
            ("-0.01", "-0.01"),
        ] {
            let txn = validate(&["01-03-2024", "Food", text, "x"]).unwrap();
            assert_eq!(txn.amount().value(), dec(expected), "{text}");
        }
    }

    #[test]
    fn test_bad_amounts() {
        for text in ["", "-", ".", "ten", "1.2.3", "$5", "1,000", "1e3", "1_000", "--1", "NaN"] {
            assert_eq!(
                validate(&["01-03-2024", "Food", text, "x"]).unwrap_err(),
                ValidationError::AmountFormat(text.to_string()),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_category_and_description_are_free_text() {
        let txn = validate(&["01-03-2024", "", "1", "  "]).unwrap();
        assert_eq!(txn.category(), "");
        assert_eq!(txn.description(), "");
        let txn = validate(&["01-03-2024", "Café ☕", "1", "with: punctuation!"]).unwrap();
        assert_eq!(txn.category(), "Café ☕");
    }

    #[test]
    fn test_to_transaction() {
        let txn = parse_line("05-11-2025,Rent,1200.00,November").unwrap();
        let row = txn.to_transaction();
        assert_eq!(row.date(), "05-11-2025");
        assert_eq!(row.amount().to_string(), "1200.00");
        assert_eq!(row.sheet_row(), None);
    }
}
