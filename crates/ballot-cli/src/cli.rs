use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ballot",
    about = "Ballot ledger: scripted voting calls with tamper-evident tallies",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Account label of the initial admin; overrides config and script
    #[arg(long, global = true)]
    pub admin: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply every call in a script and report each outcome
    Run(ScriptArgs),
    /// Run a script, then audit the journal and tallies
    Verify(ScriptArgs),
    /// Run a script, then rebuild the ledger from its journal
    Replay(ReplayArgs),
    /// Run a script, then print one ballot's results
    Results(ResultsArgs),
    /// Print the identity derived from an account label or public key
    Identity(IdentityArgs),
}

#[derive(Args)]
pub struct ScriptArgs {
    pub script: PathBuf,
}

#[derive(Args)]
pub struct ReplayArgs {
    pub script: PathBuf,
    /// Stop after this journal index
    #[arg(long)]
    pub until: Option<u64>,
}

#[derive(Args)]
pub struct ResultsArgs {
    pub script: PathBuf,
    #[arg(short, long)]
    pub ballot: u64,
    /// Sequence value to evaluate status at; defaults to the script's last
    #[arg(long)]
    pub seq: Option<u64>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("material").required(true).args(["label", "pubkey"])))]
pub struct IdentityArgs {
    /// Account label
    pub label: Option<String>,
    /// Hex-encoded 32-byte public key
    #[arg(long)]
    pub pubkey: Option<String>,
}
