use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "magpie",
    about = "Stash and restore sanitized PostgreSQL dumps",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract a sanitized dump from a source database and stash it
    Stash(StashArgs),
    /// Restore a stashed dump into a target database
    Restore(RestoreArgs),
    /// List stashed dumps and their tags
    List(ListArgs),
}

#[derive(Args)]
pub struct StashArgs {
    /// Source database URI
    pub source: String,

    /// Stash bucket (storage container)
    #[arg(short, long)]
    pub bucket: String,

    /// Tags to apply to the new dump (comma-separated or repeated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Path to the exporter config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Dump id or tag to restore
    pub dump: String,

    /// Target database URI
    pub target: String,

    /// Stash bucket (storage container)
    #[arg(short, long)]
    pub bucket: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Stash bucket (storage container)
    #[arg(short, long)]
    pub bucket: String,
}
