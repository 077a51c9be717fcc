use clap::{Parser, Subcommand};

use crate::rating::EntityKind;

#[derive(Parser, Debug)]
#[command(author, version, about = "horizon-ratings backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the backend server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Create the database schema if it does not exist
    Setup,
    /// Recompute every cached rating summary from the stored ratings
    Reconcile {
        /// Only reconcile one kind (hotel, restaurant, vacation_rental, cuisine)
        #[arg(short, long)]
        kind: Option<EntityKind>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reconcile_kind() {
        let cli = Cli::parse_from(["horizon_ratings", "reconcile", "--kind", "hotels"]);
        assert_eq!(
            cli.command,
            Command::Reconcile {
                kind: Some(EntityKind::Hotel)
            }
        );
    }

    #[test]
    fn test_serve_default_port() {
        let cli = Cli::parse_from(["horizon_ratings", "serve"]);
        assert_eq!(cli.command, Command::Serve { port: 3000 });
    }
}
