//! rbxfs CLI
//!
//! Thin caller of the core sync drivers: argument parsing, tracing setup,
//! and report rendering live here; everything else is rbxfs-core.

mod cli;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;
use rbxfs_core::{sync_in, sync_out, SyncOptions, SyncReport};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Out { dry_run }) => {
            let repo = std::env::current_dir()?;
            let report = sync_out(&repo, &SyncOptions { dry_run })?;
            print_report(&report);
            Ok(())
        }
        Some(Commands::In { dirs, dry_run }) => {
            let repo = std::env::current_dir()?;
            let only = if dirs.is_empty() {
                None
            } else {
                Some(dirs.as_slice())
            };
            let report = sync_in(&repo, only, &SyncOptions { dry_run })?;
            print_report(&report);
            Ok(())
        }
        None => {
            println!("{} place <-> repository synchronizer", "rbxfs".green().bold());
            println!();
            println!("Run {} for available commands.", "rbxfs --help".cyan());
            Ok(())
        }
    }
}

fn print_report(report: &SyncReport) {
    for line in &report.actions {
        println!("{line}");
    }
    for line in &report.errors {
        eprintln!("{}: {line}", "warning".yellow().bold());
    }
}
