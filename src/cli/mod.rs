pub mod commands;

use clap::{Parser, Subcommand};

use crate::config;

#[derive(Parser)]
#[command(name = "school-api")]
#[command(about = "School API - multi-tenant school administration backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve,

    #[command(about = "Print every resource kind with its parent and effective policy")]
    Hierarchy {
        #[arg(long, help = "Output in JSON format")]
        json: bool,
    },

    #[command(about = "Seed the initial superadmin into the configured store and exit")]
    Seed,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::config();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle(config).await,
        Commands::Hierarchy { json } => commands::hierarchy::handle(config, json),
        Commands::Seed => commands::seed::handle(config).await,
    }
}
