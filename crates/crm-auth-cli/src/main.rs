mod cli;
mod commands;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // .env is optional; real environment variables take precedence.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    let format = cli.format.unwrap_or_default();
    tracing::debug!(command = cli.command.name(), config = ?config, "Running command");

    match &cli.command {
        Commands::Keygen(args) => commands::keys::keygen(args, format)?,
        Commands::Pkce => commands::pkce::generate(format)?,
        Commands::PkceVerify(args) => commands::pkce::verify(args)?,
        Commands::CheckConfig => commands::config::check(config, format)?,
        Commands::Smoke(args) => commands::smoke::run(config, args, format).await?,
    }

    Ok(())
}
