//! Command-line interface for palcharity.
//!
//! This module provides the CLI structure for the `palcharity` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AssociationCommand, CategoryArg, ClassifyCommand, ConfigCommand, DonateCommand, DonorCommand,
    DonorFields, HistoryCommand, OutputFormat, ProjectAddCommand, ProjectCommand, StatsCommand,
    StatusCommand,
};

/// palcharity - Record donations to charitable projects
///
/// Keeps donor and association profiles, the project catalog, and an
/// append-only donation log whose money donations drive each project's
/// remaining balance.
#[derive(Debug, Parser)]
#[command(name = "palcharity")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use a throwaway in-memory store instead of the database
    #[arg(long, global = true)]
    pub memory: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage donor profiles
    #[command(subcommand)]
    Donor(DonorCommand),

    /// Manage association profiles
    #[command(subcommand)]
    Association(AssociationCommand),

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Record a donation
    Donate(DonateCommand),

    /// Show donation statistics
    #[command(subcommand)]
    Stats(StatsCommand),

    /// Show a donor's donation history
    History(HistoryCommand),

    /// Suggest a donation type from image classifier scores
    Classify(ClassifyCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
