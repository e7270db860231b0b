use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use taskgate::accounts::Accounts;
use taskgate::configuration::{get_configuration, StoreBackend};
use taskgate::startup::run;
use taskgate::store::{InMemoryUserRepository, PgUserRepository, UserRepository};
use taskgate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let repo: Arc<dyn UserRepository> = match configuration.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(configuration.store.timeout())
                .connect(&configuration.database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            let repo = PgUserRepository::new(pool);
            repo.migrate().await.map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
            })?;
            tracing::info!("Database ready");
            Arc::new(repo)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory credential store; users are lost on restart");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let accounts = Accounts::new(
        repo,
        configuration.jwt.clone(),
        configuration.store.timeout(),
        configuration.application.bcrypt_cost,
    );

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, accounts, configuration.jwt)?;
    server.await
}
