//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// rbxfs - sync place artifacts with a rule-shaped repository layout
#[derive(Parser, Debug)]
#[command(name = "rbxfs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Decompose each place artifact into its directory tree
    ///
    /// Examples:
    ///   rbxfs out             # Sync every place in the repository
    ///   rbxfs out --dry-run   # Print the planned actions instead
    Out {
        /// Plan and print actions without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Reassemble place artifacts from their directory trees
    ///
    /// Examples:
    ///   rbxfs in              # Sync every place directory
    ///   rbxfs in world        # Only the `world/` directory
    In {
        /// Restrict to these top-level directories
        dirs: Vec<String>,

        /// Plan and print actions without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}
