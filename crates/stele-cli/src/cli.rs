use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stele", version, about = "URL alias and location tree store")]
pub struct SteleCli {
    /// Store database path.
    #[arg(long, global = true, env = "STELE_STORE", default_value = "stele.db")]
    pub store: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the store (or validate an existing one).
    Init,
    /// Translate a URL into a location, resource, or redirect.
    Lookup {
        url: String,
        /// Language priority, highest first; repeatable.
        #[arg(short, long = "language")]
        languages: Vec<String>,
    },
    /// Print the canonical URL of a location.
    Path {
        node_id: i64,
        #[arg(short, long = "language")]
        languages: Vec<String>,
    },
    /// List the active URL entries of a location.
    Aliases {
        node_id: i64,
        /// Only user-authored aliases.
        #[arg(long)]
        custom_only: bool,
    },
    /// Run the alias table repair passes.
    Doctor,
    /// Show store metadata and registered languages.
    Info,
}
