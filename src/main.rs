use storefront::{Database, DatabaseConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> storefront::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = DatabaseConfig::from_env()?;

    // Initialize the database
    let db = Database::open(&config)?;
    db.create_all().await?; // Ensure the schema is created
    info!("Schema created successfully at {}", config.path);

    db.debug_dump().await?;
    Ok(())
}
