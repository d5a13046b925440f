//! FieldState CLI — the main entry point.
//!
//! Commands:
//! - `status`  — Load the field, print its snapshot, unload
//! - `enter`   — Activate the session
//! - `watch`   — Run the scheduled field runtime until Ctrl-C
//! - `id`      — Generate or validate a field id
//! - `drift`   — Preview hourly drift for an identity
//! - `config`  — Show configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fieldstate",
    about = "FieldState — persistent client identity and resonance",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the field and print its current state
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Activate the session (one-way)
    Enter,

    /// Run the field runtime and print every published snapshot
    Watch {
        /// Activate the session as soon as the field has loaded
        #[arg(long)]
        enter: bool,
    },

    /// Generate a field id, or check one against the token grammar
    Id {
        /// Token to validate instead of generating one
        #[arg(long)]
        check: Option<String>,
    },

    /// Preview the hourly drift deltas of an identity
    Drift {
        /// Identity token
        #[arg(long)]
        id: String,

        /// Number of hours to preview, starting with the current one
        #[arg(
            long,
            default_value_t = 24,
            value_parser = clap::value_parser!(u32).range(1..=commands::drift::MAX_HOURS as i64)
        )]
        hours: u32,

        /// Starting resonance for the running value
        #[arg(long)]
        from: Option<u8>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the built-in default configuration
    Default,
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Status { json } => commands::status::run(json).await?,
        Commands::Enter => commands::enter::run().await?,
        Commands::Watch { enter } => commands::watch::run(enter).await?,
        Commands::Id { check } => commands::id::run(check).await?,
        Commands::Drift { id, hours, from } => commands::drift::run(&id, hours, from).await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Default) {
            ConfigAction::Default => commands::config_cmd::default().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("fieldstate").chain(args.iter().copied()))
    }

    #[test]
    fn drift_hours_are_bounded() {
        assert!(parse(&["drift", "--id", "K44-R∞-A0B-K725-iX", "--hours", "48"]).is_ok());
        assert!(parse(&["drift", "--id", "K44-R∞-A0B-K725-iX", "--hours", "0"]).is_err());
        assert!(parse(&["drift", "--id", "K44-R∞-A0B-K725-iX", "--hours", "4294967295"]).is_err());
    }

    #[test]
    fn drift_defaults_to_a_day() {
        let cli = parse(&["drift", "--id", "K44-R∞-A0B-K725-iX"]).unwrap();
        assert!(matches!(cli.command, Commands::Drift { hours: 24, .. }));
    }
}
