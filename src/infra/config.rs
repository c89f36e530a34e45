//! Centralized configuration (environment variables + defaults).
//!
//! Call `dotenv::dotenv().ok()` before reading any of these so a local `.env` is honoured.

pub const DEFAULT_DATABASE_URL: &str = "postgresql://postgres@localhost:5432/visitor_db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Prefix of `DATABASE_URL` that selects the in-process store.
pub const MEMORY_URL_PREFIX: &str = "memory:";

/// Database connection string; falls back to a local PostgreSQL database.
pub fn database_url() -> String {
    non_empty_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Whether `url` selects the in-process store.
pub fn is_memory_url(url: &str) -> bool {
    url.starts_with(MEMORY_URL_PREFIX)
}

/// Connection pool size.
pub fn max_connections() -> u32 {
    parse_max_connections(std::env::var("DB_MAX_CONNECTIONS").ok().as_deref())
}

pub fn bind_addr() -> String {
    non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}

/// Directory served under `/static`.
pub fn static_dir() -> String {
    non_empty_var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}

/// `EnvFilter` directives for the logger.
pub fn log_filter() -> String {
    non_empty_var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_max_connections(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
        .max(1)
}
