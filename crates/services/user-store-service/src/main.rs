//! User Store Service - HTTP server and maintenance commands.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_store_service::MigrateAction;

#[derive(Parser)]
#[command(name = "user-store-service")]
#[command(about = "Role-scoped user record stores")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address, defaults to SERVER_HOST
        #[arg(long)]
        host: Option<String>,
        /// Listen port, defaults to SERVER_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Finish migrations interrupted between write and delete
    Reconcile {
        /// Only act on markers older than this many seconds
        #[arg(long)]
        grace_seconds: Option<i64>,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            user_store_service::run_server(host, port).await?;
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            user_store_service::run_migrations(migrate_action).await?;
        }
        Commands::Reconcile { grace_seconds } => {
            let report = user_store_service::run_reconcile(grace_seconds).await?;
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
