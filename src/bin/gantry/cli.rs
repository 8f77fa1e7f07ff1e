//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Gantry - plans Apple compile, archive, and link actions for one
/// compilation unit
#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan the unit's action graph and emit it as JSON
    Plan(PlanArgs),

    /// Check a unit manifest's attributes without planning
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct PlanArgs {
    /// Path to the unit manifest
    #[arg(long)]
    pub manifest: PathBuf,

    /// Write the action graph here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the unit manifest
    #[arg(long)]
    pub manifest: PathBuf,
}
