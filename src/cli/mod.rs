// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// blckbx-schema - Collection bootstrap for the BLCK BX itinerary backend
///
/// Registers the itinerary collections (projects, destinations, travel legs,
/// venues and helpful information) with the backing store.
#[derive(Parser, Debug)]
#[command(name = "blckbx-schema")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collection bootstrap for the BLCK BX itinerary backend")]
#[command(long_about = "blckbx-schema - Collection bootstrap for the BLCK BX itinerary backend

Declares the fixed catalog of itinerary collections and registers it with the
configured database, parents before the collections that reference them.

blckbx-schema helps you:
  • Validate the collection catalog before deployment
  • Create or update collections without losing store-only fields
  • Record which catalog revision has been applied
  • Export the catalog as collection import JSON

Supported databases: PostgreSQL, MySQL, SQLite")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Initialize a project:          blckbx-schema init --dialect sqlite
  2. Check the catalog:             blckbx-schema validate
  3. Preview the changes:           blckbx-schema apply --dry-run
  4. Register the collections:      blckbx-schema apply
  5. Check the applied state:       blckbx-schema status

For detailed help on each command, use: blckbx-schema <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    ///
    /// EXAMPLES:
    ///   # Initialize with SQLite
    ///   blckbx-schema init --dialect sqlite
    ///
    ///   # Overwrite an existing configuration
    ///   blckbx-schema init --dialect postgresql --force
    Init {
        /// Database dialect (postgresql, mysql, sqlite)
        #[arg(short, long, value_name = "DIALECT", default_value = "sqlite")]
        dialect: String,

        /// Overwrite the configuration file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the collection catalog
    ///
    /// Checks relation targets, field identifiers, select defaults and
    /// relation cardinality, then prints the order collections are created in.
    Validate,

    /// Register the collection catalog with the database
    ///
    /// EXAMPLES:
    ///   # Apply to development environment
    ///   blckbx-schema apply
    ///
    ///   # Preview without writing
    ///   blckbx-schema apply --dry-run
    ///
    ///   # Leave existing collections untouched
    ///   blckbx-schema apply --env production --on-conflict skip
    Apply {
        /// Target environment
        #[arg(short, long, value_name = "ENV", default_value = "development")]
        env: String,

        /// Dry run - show the plan without writing
        #[arg(long)]
        dry_run: bool,

        /// How to treat existing collections (update, skip, fail)
        #[arg(long, value_name = "POLICY")]
        on_conflict: Option<String>,

        /// Re-run even if this catalog revision is already recorded
        #[arg(long)]
        force: bool,
    },

    /// Show the applied catalog revision and per-collection state
    ///
    /// EXAMPLES:
    ///   blckbx-schema status --env production
    Status {
        /// Target environment
        #[arg(short, long, value_name = "ENV", default_value = "development")]
        env: String,
    },

    /// Export the catalog as collection import JSON
    ///
    /// EXAMPLES:
    ///   # Print to stdout
    ///   blckbx-schema export
    ///
    ///   # Write to a file
    ///   blckbx-schema export --output pb_schema.json
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
