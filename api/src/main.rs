use clap::{Parser, Subcommand};
use poem::{listener::TcpListener, Server};
use std::sync::Arc;
use storefront_api::cleanup_service::{clean_carts, CartCleanup, CartCleanupService};
use storefront_api::config::AppConfig;
use storefront_api::database::{now_ns, Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront-server")]
#[command(about = "Storefront API Server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Deactivate expired carts, or delete inactive carts with --delete
    CleanCarts {
        /// Delete inactive carts instead of deactivating expired ones
        #[arg(long)]
        delete: bool,
    },
}

async fn open_database(config: &AppConfig) -> Result<Arc<Database>, std::io::Error> {
    match Database::new(&config.database_url).await {
        Ok(db) => {
            tracing::info!("Database initialized at {}", config.database_url);
            Ok(Arc::new(db))
        }
        Err(e) => {
            tracing::error!(
                "Failed to initialize database at {}: {:#}",
                config.database_url,
                e
            );
            Err(std::io::Error::other(format!(
                "Database initialization failed: {}",
                e
            )))
        }
    }
}

async fn serve_command(config: AppConfig) -> Result<(), std::io::Error> {
    let database = open_database(&config).await?;
    let addr = format!("0.0.0.0:{}", config.port);

    let cleanup_service =
        CartCleanupService::new(database.clone(), config.cart_cleanup_interval_hours);
    let cleanup_task = tokio::spawn(async move {
        cleanup_service.run().await;
    });

    tracing::info!("Starting storefront API server on {}", addr);
    let app = storefront_api::build_app(database, config);
    let server_result = Server::new(TcpListener::bind(&addr)).run(app).await;

    cleanup_task.abort();
    server_result
}

async fn clean_carts_command(config: AppConfig, delete: bool) -> Result<(), std::io::Error> {
    let database = open_database(&config).await?;
    let mode = if delete {
        CartCleanup::DeleteInactive
    } else {
        CartCleanup::DeactivateExpired
    };

    let affected = clean_carts(&database, mode, now_ns())
        .await
        .map_err(|e| std::io::Error::other(format!("Cart cleanup failed: {:#}", e)))?;
    println!("{} carts affected", affected);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve => serve_command(config).await,
        Commands::CleanCarts { delete } => clean_carts_command(config, delete).await,
    }
}
