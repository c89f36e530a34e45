use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use visitor_book::infra::{config, logging};
use visitor_book::storage::{MemoryVisitorGateway, PgVisitorGateway, VisitorGateway};
use visitor_book::transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Logging comes first; every later component reports through it.
    logging::init(&config::log_filter())?;
    info!(event = "startup", "Starting the Visitor Book application");

    // --- Persistence Gateway Initialization ---
    let database_url = config::database_url();
    let gateway: Arc<dyn VisitorGateway> = if config::is_memory_url(&database_url) {
        info!(
            event = "storage_ready",
            backend = "memory",
            "using the in-process visitor store (data is lost on exit)"
        );
        Arc::new(MemoryVisitorGateway::new())
    } else {
        let max_connections = config::max_connections();
        let gateway = PgVisitorGateway::connect(&database_url, max_connections)
            .await
            .context("could not connect to the database and ensure the visitors table")?;
        info!(
            event = "storage_ready",
            backend = "postgres",
            max_connections,
            "connection pool ready"
        );
        Arc::new(gateway)
    };

    // --- API Server Initialization ---
    let app_state = transport::http::AppState::new(gateway);
    let app = transport::http::create_router(app_state, &config::static_dir());

    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("could not bind {bind_addr}"))?;
    info!(
        event = "listening",
        addr = %bind_addr,
        "API server listening (Swagger UI at /swagger-ui)"
    );

    tokio::select! {
        result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!(event = "shutdown", "Shutdown signal received, stopping");
        }
    }

    Ok(())
}
