use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI - session and content tooling for the blog portal", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/folio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON seed for the in-memory backend (defaults to ~/.config/folio/seed.json)
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Drive the session manager
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// List posts
    Posts(commands::content::ListArgs),
    /// List downloadable resources
    Resources(commands::content::ListArgs),
    /// List categories and tags
    Taxonomy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let seed = cli.seed.as_deref();

    match cli.command {
        Commands::Config { action } => commands::config::run(config, &action)?,
        Commands::Session { action } => {
            let ctx = context::AppContext::load(config, seed).await?;
            commands::session::run(&ctx, action).await?
        }
        Commands::Posts(args) => {
            let ctx = context::AppContext::load(config, seed).await?;
            commands::content::list_posts(&ctx, &args).await?
        }
        Commands::Resources(args) => {
            let ctx = context::AppContext::load(config, seed).await?;
            commands::content::list_resources(&ctx, &args).await?
        }
        Commands::Taxonomy => {
            let ctx = context::AppContext::load(config, seed).await?;
            commands::content::list_taxonomy(&ctx).await?
        }
    }

    Ok(())
}
