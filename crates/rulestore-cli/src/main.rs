mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let app_config = crate::config::resolve(&cli)?;
    observability::init_tracing_with_level(&app_config.logging.level);
    let format = cli.format.unwrap_or_default();

    if let Commands::Config = &cli.command {
        return show_config(&app_config);
    }

    let mut adapter = commands::connect(&app_config.mongodb).await?;
    match &cli.command {
        Commands::List(args) => commands::policy::list(&adapter, args, format).await?,
        Commands::Add(args) => commands::policy::add(&mut adapter, args).await?,
        Commands::Remove(args) => commands::policy::remove(&mut adapter, args).await?,
        Commands::RemoveFiltered(args) => {
            commands::policy::remove_filtered(&mut adapter, args).await?;
        }
        Commands::Import(args) => commands::transfer::import(&mut adapter, args).await?,
        Commands::Export(args) => commands::transfer::export(&adapter, args).await?,
        Commands::Clear(args) => commands::policy::clear(&adapter, args.yes).await?,
        Commands::Config => {}
    }

    Ok(())
}

fn show_config(app_config: &crate::config::AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(&app_config.redacted())
        .context("Failed to render configuration")?;
    println!("{}", "# Effective configuration".cyan());
    print!("{rendered}");
    Ok(())
}
