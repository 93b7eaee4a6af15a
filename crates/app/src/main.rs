use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerd={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let Some(listen) = settings.server else {
        tracing::warn!("no [server] section configured, nothing to run");
        return Ok(());
    };

    let db = parse_database(&listen.database).await?;
    let engine = engine::Engine::builder()
        .database(db.clone())
        .deletion(settings.ledger.deletion)
        .default_currency(settings.ledger.default_currency)
        .build()
        .await?;
    tracing::info!(
        deletion = ?settings.ledger.deletion,
        currency = %settings.ledger.default_currency,
        "engine ready"
    );

    let bind = listen.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, listen.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let state = server::ServerState::new(engine, db, listen.public_url);
    server::run_with_listener(state, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = match config {
        // Every pooled connection would otherwise open its own empty database.
        Database::Memory => {
            let mut options = ConnectOptions::new("sqlite::memory:");
            options.max_connections(1).min_connections(1);
            options
        }
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{}?mode=rwc", path)),
    };
    options.sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
