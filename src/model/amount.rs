//! Money values as they appear in sheet cells.
//!
//! Cells may hold plain numbers (`-8.50`) or spreadsheet-formatted currency (`-$1,234.50`). The
//! `Amount` type wraps `Decimal` and remembers which of the two it was parsed from so that it can
//! be written back the same way.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// Represents how an amount was (or should be) formatted.
///
/// # Examples
///  - `AmountFormat::CURRENCY` -> `-$60,000.00`
///  - `AmountFormat::PLAIN` -> `-60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a dollar sign is present in the formatting.
    dollar: bool,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl AmountFormat {
    /// Dollar sign and thousands separators, two decimal places: `-$60,000.00`.
    pub const CURRENCY: AmountFormat = AmountFormat {
        dollar: true,
        commas: true,
    };

    /// The bare decimal value with its own scale: `-60000.5`.
    pub const PLAIN: AmountFormat = AmountFormat {
        dollar: false,
        commas: false,
    };
}

impl Default for AmountFormat {
    fn default() -> Self {
        AmountFormat::PLAIN
    }
}

/// Represents a money amount read from, or written to, a sheet cell.
///
/// Formatting is significant for equality, so for numeric comparisons access the `Decimal` with
/// `value()`.
///
/// ```
/// # use fintrack::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("-5000.00").unwrap();
/// let b = Amount::from_str("-$5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// assert_eq!(b.to_string(), "-$5,000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
    format: AmountFormat,
}

impl Amount {
    /// An amount that renders as a plain decimal, which is how derived cells are written.
    pub const fn plain(value: Decimal) -> Self {
        Self {
            value,
            format: AmountFormat::PLAIN,
        }
    }

    /// An amount that renders as currency, e.g. `$1,234.50`, for reports.
    pub const fn currency(value: Decimal) -> Self {
        Self {
            value,
            format: AmountFormat::CURRENCY,
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn format(&self) -> AmountFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }
}

/// Parses a numeric sheet cell, treating a blank or unparseable cell as zero.
///
/// This is the only place where bad numeric data is silently accepted. It exists for budget cells
/// which are routinely left blank by hand.
pub fn parse_or_zero(cell: &str) -> Decimal {
    match Amount::from_str(cell) {
        Ok(amount) => amount.value(),
        Err(e) => {
            debug!("Treating unparseable cell '{cell}' as zero: {e}");
            Decimal::ZERO
        }
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Removes an optional dollar sign (after an optional minus) from `s`.
fn strip_dollar(s: &str) -> (String, bool) {
    if let Some(after_minus) = s.strip_prefix('-') {
        match after_minus.strip_prefix('$') {
            Some(after_dollar) => (format!("-{after_dollar}"), true),
            None => (s.to_string(), false),
        }
    } else {
        match s.strip_prefix('$') {
            Some(after_dollar) => (after_dollar.to_string(), true),
            None => (s.to_string(), false),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// An empty (or all-whitespace) string parses as zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (without_dollar, dollar) = strip_dollar(trimmed);
        let without_commas = without_dollar.replace(',', "");
        let commas = without_commas.len() < without_dollar.len();

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount {
            value,
            format: AmountFormat { dollar, commas },
        })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.value.abs();
        let dol = if self.format.dollar { "$" } else { "" };

        if self.format.commas {
            write!(
                f,
                "{sign}{dol}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{dol}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::plain(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
