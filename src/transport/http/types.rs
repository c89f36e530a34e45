use crate::storage::VisitorGateway;
use axum::extract::ConnectInfo;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn VisitorGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn VisitorGateway>) -> Self {
        Self { gateway }
    }
}

/// Body of `POST /add`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct AddVisitorForm {
    /// Raw submitted name; surrounding whitespace is trimmed before storing.
    #[schema(example = "  Alice  ")]
    pub name: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Host logged for requests whose peer address is not known.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub fn client_host(connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
