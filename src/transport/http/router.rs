use crate::domain::model::Visitor;
use crate::transport::http::handlers::{health, visitors};
use crate::transport::http::types::{AddVisitorForm, AppState, HealthResponse};
use crate::transport::http::views::{self, GENERIC_FAILURE_DETAIL};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{error, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Visitor Book"),
    paths(
        visitors::list_visitors_handler,
        visitors::add_visitor_handler,
        health::healthcheck_handler
    ),
    components(schemas(Visitor, AddVisitorForm, HealthResponse))
)]
pub struct ApiDoc;

/// Application routes, Swagger UI and `/static`, all behind request logging and panic recovery.
pub fn create_router(app_state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(visitors::list_visitors_handler))
        .route("/add", post(visitors::add_visitor_handler))
        .route("/health", get(health::healthcheck_handler))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)))
}

pub(crate) fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    error!(
        event = "unhandled_panic",
        panic = %detail,
        "request handler panicked"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(views::render_error(GENERIC_FAILURE_DETAIL)),
    )
        .into_response()
}
