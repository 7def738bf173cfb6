mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use classdesk_core::Dashboard;

use crate::cli::{Cli, Command};
use crate::commands::Ctx;
use crate::config::ActiveProfile;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "classdesk", &mut std::io::stdout());
            Ok(())
        }

        // Static catalogue, no API needed
        Command::Resources => {
            commands::resources::handle(&cli.global);
            Ok(())
        }

        // Everything else talks to the API through a dashboard
        cmd => {
            let active = ActiveProfile::resolve(&cli.global)?;
            let dashboard = Dashboard::new(active.dashboard_config()?)
                .map_err(|e| CliError::from_core(&e, &active.name))?;

            tracing::debug!(command = ?cmd, profile = %active.name, "dispatching command");
            let ctx = Ctx {
                global: &cli.global,
                active: &active,
            };
            commands::dispatch(cmd, &dashboard, &ctx).await
        }
    }
}
