//! These structs provide the CLI interface for the eqclose CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// eqclose: automates the monthly stock-based-compensation close.
///
/// The program reads an equity amortization workbook, reconciles a pivoted
/// expense view against an independently prepared journal-entry extract,
/// builds balanced journal-entry line items for the US and Canada entity
/// groups, and writes a review workbook plus JSON payloads. Each generated
/// batch is recorded in a local approval ledger; once a batch is approved,
/// `eqclose push` submits its payloads to the accounting system through an
/// MCP server.
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
    /// Create the data directory, the default config file and the approval
    /// ledger database.
    ///
    /// This is the first command you should run. Decide what directory you
    /// want to store data in and pass this as --eqclose-home. By default it
    /// will be $HOME/eqclose.
    Init,
    /// Run the close pipeline over a source workbook and record a new batch
    /// in the approval ledger.
    Generate(GenerateArgs),
    /// Mark a ledger batch as approved for push.
    Approve(BatchArgs),
    /// Mark a ledger batch as rejected.
    Reject(BatchArgs),
    /// Submit the payloads of every approved, not-yet-pushed batch to the
    /// accounting system.
    Push,
    /// Print the approval ledger.
    List,
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

    /// The directory where eqclose data and configuration is held. Defaults
    /// to ~/eqclose
    #[arg(long, env = "EQCLOSE_HOME", default_value_t = default_eqclose_home())]
    eqclose_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, eqclose_home: PathBuf) -> Self {
        Self {
            log_level,
            eqclose_home: eqclose_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn eqclose_home(&self) -> &DisplayPath {
        &self.eqclose_home
    }
}

/// Args for the `eqclose generate` command.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// The source workbook holding the amortization and journal-entry sheets.
    #[arg(long)]
    source: PathBuf,

    /// The mapping workbook with Account/Department/Class/Location internal
    /// ids. When omitted, payload ids are written as 0.
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// The period label used in entry memos, e.g. "Oct 2025".
    #[arg(long)]
    period: String,
}

impl GenerateArgs {
    pub fn new(source: impl Into<PathBuf>, mapping: Option<PathBuf>, period: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            mapping,
            period: period.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn mapping(&self) -> Option<&Path> {
        self.mapping.as_deref()
    }

    pub fn period(&self) -> &str {
        &self.period
    }
}

/// Args for the `eqclose approve` and `eqclose reject` commands.
#[derive(Debug, Parser, Clone)]
pub struct BatchArgs {
    /// The ledger batch id, as shown by `eqclose list`.
    batch_id: i64,
}

impl BatchArgs {
    pub fn new(batch_id: i64) -> Self {
        Self { batch_id }
    }

    pub fn batch_id(&self) -> i64 {
        self.batch_id
    }
}

fn default_eqclose_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("eqclose"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --eqclose-home or EQCLOSE_HOME instead of relying on the \
                default eqclose home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("eqclose")
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
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
