pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use parley_core::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Parley dialog-policy CLI",
    long_about = "Run seeded self-play between the rule-based system policy and the \
                  agenda user simulator, inspect effective configuration, and check \
                  runtime readiness.",
    after_help = "Examples:\n  parley simulate --sessions 5 --seed 7\n  parley config\n  parley doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run seeded self-play sessions and report success statistics")]
    Simulate {
        #[arg(long, help = "Number of sessions to run")]
        sessions: Option<u32>,
        #[arg(long, help = "Master seed for reproducible runs")]
        seed: Option<u64>,
        #[arg(long = "max-turns", help = "Per-session turn budget (must be even)")]
        max_turns: Option<u32>,
        #[arg(long, help = "Include full dialog transcripts in the output")]
        transcript: bool,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(
        about = "Validate config, ontology integrity, the role-flag contract, and a smoke session"
    )]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn init_logging(config: &AppConfig) {
    use parley_core::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands re-load config themselves and report their own failures; a
    // broken config only costs us log output here.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Simulate { sessions, seed, max_turns, transcript, json } => {
            commands::simulate::run(commands::simulate::SimulateArgs {
                sessions,
                seed,
                max_turns,
                transcript,
                json,
            })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
