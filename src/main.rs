use std::process::ExitCode;

use clap::{Parser, Subcommand};

use issuebot::commands;
use issuebot::commands::check::CheckArgs;
use issuebot::commands::init::InitArgs;
use issuebot::commands::run::RunArgs;
use issuebot::error::ExitError;
use issuebot::telemetry;

#[derive(Debug, Parser)]
#[command(
    name = "issuebot",
    version,
    about = "Chat bot that looks up #123 issue references",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Arguments for `run` when no subcommand is given
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Connect through the stdin/stdout bridge and answer chat (default)
    Run(RunArgs),
    /// Validate the config, optionally probing the tracker
    Check(CheckArgs),
    /// Write a commented sample config
    Init(InitArgs),
    /// Print the JSON Schema for issuebot.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Check(_) => "check",
            Self::Init(_) => "init",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    let _telemetry = telemetry::init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run(cli.run));

    let _span = tracing::info_span!("command", name = command.name()).entered();

    let result = match command {
        Commands::Run(args) => args.execute(),
        Commands::Check(args) => args.execute(),
        Commands::Init(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
