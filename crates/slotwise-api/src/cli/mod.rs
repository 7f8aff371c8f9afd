//! CLI command definitions for the `slotctl` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `slotctl list providers`, `slotctl show booking <id>`).

pub mod booking;
pub mod provider;
pub mod seed;
pub mod status;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Slot allocation and booking lifecycle for a mechanic workshop.
#[derive(Parser)]
#[command(name = "slotctl", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show details of a provider or booking.
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },

    /// Book a slot with a provider. Prompts for anything not given as a flag.
    Book {
        /// Provider id or name.
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        /// Car licence plate.
        #[arg(long)]
        license: Option<String>,

        /// Car engine number.
        #[arg(long)]
        engine: Option<String>,

        /// Appointment date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Move a booking to a new status (confirmed, in-progress, completed, cancelled).
    Transition {
        /// Booking id.
        id: String,

        /// Target status.
        status: String,
    },

    /// Change a provider's total daily slots.
    Capacity {
        /// Provider id or name.
        provider: String,

        /// New total slot count.
        total_slots: u32,
    },

    /// Move an active booking to another date.
    Reschedule {
        /// Booking id.
        id: String,

        /// New appointment date (YYYY-MM-DD).
        date: NaiveDate,
    },

    /// Register providers from the built-in roster or a TOML file.
    Seed {
        /// Roster file; the built-in five-mechanic roster when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Cancel pending bookings older than the configured TTL.
    Sweep,

    /// Slot and booking overview.
    Status,

    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List all providers with their slot availability.
    Providers,

    /// List bookings, newest first.
    Bookings {
        /// Comma-separated statuses, or `active`.
        #[arg(long)]
        status: Option<String>,

        /// Provider id or name.
        #[arg(long)]
        provider: Option<String>,

        /// Client phone number.
        #[arg(long)]
        phone: Option<String>,

        /// Appointment date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Maximum number of bookings to show.
        #[arg(long, default_value = "50")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum ShowResource {
    /// Show a provider by id or name.
    Provider { provider: String },

    /// Show a booking by id.
    Booking { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_transition() {
        let cli = Cli::try_parse_from(["slotctl", "--json", "transition", "abc", "completed"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Transition { ref id, ref status } if id == "abc" && status == "completed"
        ));
    }

    #[test]
    fn parses_book_flags() {
        let cli = Cli::try_parse_from([
            "slotctl",
            "book",
            "--provider",
            "David Wilson",
            "--date",
            "2030-01-15",
        ])
        .unwrap();
        match cli.command {
            Commands::Book { provider, date, name, .. } => {
                assert_eq!(provider.as_deref(), Some("David Wilson"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2030, 1, 15));
                assert!(name.is_none());
            }
            _ => panic!("expected book"),
        }
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["slotctl", "reschedule", "abc", "15/01/2030"]).is_err());
    }
}
