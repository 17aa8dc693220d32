//! These structs provide the CLI interface for the fintrack CLI.

use crate::model::LedgerKind;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// fintrack: A command-line personal finance tracker.
///
/// Records expense and income transactions in a workbook and keeps its budget sheet reconciled:
/// actual spending, surplus or deficit, and projected and actual net income for every budget
/// category.
///
/// Run `fintrack init` first, then either `fintrack session` for the interactive loop or the
/// one-shot `add`, `reconcile` and `report` commands.
#[derive(Debug, Parser, Clone)]
#[command(name = "fintrack", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the workbook.
    ///
    /// The workbook holds three CSV sheets: expenses, income and budget. Each starts with only its
    /// header row; fill in the budget sheet's Category and Budgeted Amount columns yourself.
    /// Running init again keeps existing files.
    Init,
    /// Start the interactive session: add transactions and update the budget until you quit.
    Session,
    /// Validate one transaction line, append it to a ledger, and reconcile the budget.
    Add(AddArgs),
    /// Recompute the budget sheet's derived columns from the ledgers.
    Reconcile,
    /// Print total income, total expenses and net income without changing anything.
    Report,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where fintrack data and configuration is held. Defaults to ~/fintrack
    #[arg(long, env = "FINTRACK_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `fintrack add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The ledger to append to: expense or income
    ledger: LedgerKind,

    /// The transaction as "DD-MM-YYYY, Category, Amount, Description"
    line: String,
}

impl AddArgs {
    pub fn new(ledger: LedgerKind, line: impl Into<String>) -> Self {
        Self {
            ledger,
            line: line.into(),
        }
    }

    pub fn ledger(&self) -> LedgerKind {
        self.ledger
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("fintrack"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or FINTRACK_HOME instead of relying on the default \
                fintrack home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("fintrack")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
