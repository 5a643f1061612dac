mod commands;
mod profile;
mod render;
mod scheduler;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odocal")]
#[command(about = "Sync your Odoo calendar locally and schedule event reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to an Odoo instance and store the profile
    Login {
        /// Instance URL, e.g. erp.example.com (https assumed)
        url: String,

        /// Database name
        #[arg(short, long)]
        database: String,

        /// Login username (usually an email)
        #[arg(short, long)]
        username: String,

        /// Password; prompted securely when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Fetch events from the server and register reminders
    Sync,
    /// Show the locally cached events (works offline)
    Events,
    /// Forget the stored profile and the cached events
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Login {
            url,
            database,
            username,
            password,
        } => commands::login::run(&url, &database, &username, password).await,
        Commands::Sync => commands::sync::run().await,
        Commands::Events => commands::events::run(),
        Commands::Logout => commands::logout::run(),
    }
}
