//! These structs provide the CLI interface for the pantry CLI.

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// pantry: A command-line tool for keeping a campus food pantry's stock.
///
/// Staff export their purchase orders from a spreadsheet as CSV and import them here. Each row
/// either tops up an existing item or adds a new one, and every stock movement is written to a
/// transaction log. Students check items out against per-item limits, and `report` summarizes
/// what is on the shelves and what has been moving.
#[derive(Debug, Parser, Clone)]
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
    /// Create the pantry home directory, its configuration file and an empty database.
    ///
    /// This is the first command you should run. The directory is $HOME/pantry unless you pass
    /// --pantry-home or set PANTRY_HOME.
    Init,
    /// Import a CSV purchase order into the inventory.
    ///
    /// The file needs a header row with a product column and a quantity column. Weight and price
    /// columns are optional. Rows that cannot be imported are reported and skipped; the rest of
    /// the file is still imported. The command exits with an error if any row failed.
    Import(ImportArgs),
    /// List the inventory.
    Items(ItemsArgs),
    /// List the most recent stock movements.
    Transactions(TransactionsArgs),
    /// Check an item out to a student.
    Checkout(CheckoutArgs),
    /// Summarize stock on hand and recent movements.
    Report(ReportArgs),
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

    /// The directory where pantry data and configuration is held. Defaults to ~/pantry
    #[arg(long, env = "PANTRY_HOME", default_value_t = default_pantry_home())]
    pantry_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, pantry_home: PathBuf) -> Self {
        Self {
            log_level,
            pantry_home: pantry_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn pantry_home(&self) -> &DisplayPath {
        &self.pantry_home
    }
}

/// (Not shown): Args for the `pantry import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The CSV file to import.
    file: PathBuf,

    /// Who is doing the import. Defaults to `default_actor` from the config file.
    #[arg(long)]
    actor: Option<String>,

    /// Reconcile the file against the current inventory and print the result without saving
    /// anything.
    #[arg(long)]
    dry_run: bool,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>, actor: Option<String>, dry_run: bool) -> Self {
        Self {
            file: file.into(),
            actor,
            dry_run,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// How a listing is printed.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// An aligned text table.
    #[default]
    Table,
    /// A JSON array of objects.
    Json,
    /// CSV with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// (Not shown): Args for the `pantry items` command.
#[derive(Debug, Parser, Clone)]
pub struct ItemsArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl ItemsArgs {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `pantry transactions` command.
#[derive(Debug, Parser, Clone)]
pub struct TransactionsArgs {
    /// How many records to show, newest first.
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

impl TransactionsArgs {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// (Not shown): Args for the `pantry checkout` command.
#[derive(Debug, Parser, Clone)]
pub struct CheckoutArgs {
    /// The item's id or its name (case-insensitive).
    #[arg(long)]
    item: String,

    /// How much to take, in the item's unit.
    #[arg(long)]
    quantity: Decimal,

    /// The id of the student taking the item.
    #[arg(long)]
    student: String,
}

impl CheckoutArgs {
    pub fn new(item: impl Into<String>, quantity: Decimal, student: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            quantity,
            student: student.into(),
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn student(&self) -> &str {
        &self.student
    }
}

/// (Not shown): Args for the `pantry report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// How many days of transactions to summarize.
    #[arg(long, default_value_t = 7)]
    days: u32,
}

impl ReportArgs {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }
}

fn default_pantry_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pantry"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --pantry-home or PANTRY_HOME instead of relying on the default \
                pantry home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("pantry")
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
