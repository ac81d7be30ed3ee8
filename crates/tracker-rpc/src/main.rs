mod cli;
mod commands;
mod config;
mod logging;
mod output;
mod rpc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::Session;
use config::Config;
use output::output_error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli) {
        output_error(&e, format);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<()> {
    // Completions need neither config nor a tracker
    if let Commands::Completions { shell } = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let mut config = Config::load(cli.config.clone())?;
    config.merge_with_cli(cli.url.clone(), cli.login.clone(), cli.password.clone());
    logging::init(config.log_level.as_deref());

    let client = config.client();

    // RPC callers name their tracker per request
    if let Commands::Rpc { action } = &cli.command {
        return commands::rpc::handle_rpc(&client, &config, action, cli.format);
    }

    config.validate()?;
    let tracker = config.tracker();
    let ctx = config.call_context();
    let session = Session {
        client: &client,
        tracker: &tracker,
        ctx: &ctx,
    };

    match &cli.command {
        Commands::Project { action } => {
            commands::project::handle_project(&session, action, cli.format)
        }
        Commands::Issue { action } => commands::issue::handle_issue(&session, action, cli.format),
        Commands::User => commands::user::handle_user(&session, cli.format),
        Commands::Report { action } => {
            commands::report::handle_report(&session, action, cli.format)
        }
        Commands::Rpc { .. } | Commands::Completions { .. } => Ok(()),
    }
}
