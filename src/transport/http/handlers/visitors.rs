use crate::domain::model::Visitor;
use crate::storage::{GatewayError, VisitorGateway, VisitorSession};
use crate::transport::http::types::{client_host, AddVisitorForm, AppState};
use crate::transport::http::views::{self, LIST_FAILURE_DETAIL};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use std::error::Error as StdError;
use std::net::SocketAddr;
use tracing::{error, info, warn};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Visitor list page", body = String, content_type = "text/html"),
        (status = 500, description = "Generic error page", body = String, content_type = "text/html")
    )
)]
pub async fn list_visitors_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let client_host = client_host(connect_info.as_ref());
    info!(
        event = "get_visitors_request",
        path = "/",
        client_host = %client_host,
        "list visitors request received"
    );

    match fetch_visitors(state.gateway.as_ref()).await {
        Ok(visitors) => {
            info!(
                event = "get_visitors_success",
                path = "/",
                visitor_count = visitors.len(),
                "visitors retrieved"
            );
            Html(views::render_index(&visitors)).into_response()
        }
        Err(err) => {
            let event = if err.is_storage() {
                "get_visitors_db_error"
            } else {
                "get_visitors_unexpected_error"
            };
            error!(
                event = event,
                path = "/",
                client_host = %client_host,
                error = &err as &(dyn StdError + 'static),
                "could not retrieve visitors"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::render_error(LIST_FAILURE_DETAIL)),
            )
                .into_response()
        }
    }
}

async fn fetch_visitors(gateway: &dyn VisitorGateway) -> Result<Vec<Visitor>, GatewayError> {
    let mut session = gateway.open_session().await?;
    let result = session.list_all().await;
    // Read-only: end the transaction before the connection goes back to the pool.
    discard(&mut *session, "/").await;
    result
}

#[utoipa::path(
    post,
    path = "/add",
    request_body(content = AddVisitorForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Always redirects back to the list; failures are only logged")
    )
)]
pub async fn add_visitor_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Form(form): Form<AddVisitorForm>,
) -> Redirect {
    let visitor_name = form.name.trim();
    let client_host = client_host(connect_info.as_ref());
    info!(
        event = "add_visitor_request",
        path = "/add",
        submitted_name = %form.name,
        processed_name = visitor_name,
        client_host = %client_host,
        "add visitor request received"
    );

    if visitor_name.is_empty() {
        warn!(
            event = "add_visitor_empty_name",
            path = "/add",
            submitted_name = %form.name,
            processed_name = visitor_name,
            client_host = %client_host,
            "empty name submitted, nothing stored"
        );
        return Redirect::to("/");
    }

    match store_visitor(state.gateway.as_ref(), visitor_name).await {
        Ok(visitor) => {
            info!(
                event = "add_visitor_success",
                visitor_id = visitor.id,
                path = "/add",
                submitted_name = %form.name,
                processed_name = visitor_name,
                client_host = %client_host,
                "visitor stored"
            );
        }
        Err(err) => {
            let event = if err.is_storage() {
                "add_visitor_db_error"
            } else {
                "add_visitor_unexpected_error"
            };
            error!(
                event = event,
                path = "/add",
                submitted_name = %form.name,
                processed_name = visitor_name,
                client_host = %client_host,
                error = &err as &(dyn StdError + 'static),
                "could not store visitor"
            );
        }
    }

    // 303 so a reload re-fetches the list instead of re-posting the form.
    Redirect::to("/")
}

/// Inserts and commits; on any failure after the session opened, rolls it back first.
async fn store_visitor(gateway: &dyn VisitorGateway, name: &str) -> Result<Visitor, GatewayError> {
    let mut session = gateway.open_session().await?;
    let result = async {
        let visitor = session.insert(name).await?;
        session.commit().await?;
        Ok::<_, GatewayError>(visitor)
    }
    .await;
    if result.is_err() {
        discard(&mut *session, "/add").await;
    }
    result
}

async fn discard(session: &mut dyn VisitorSession, path: &str) {
    if let Err(err) = session.rollback().await {
        warn!(
            event = "session_rollback_failed",
            path = path,
            error = &err as &(dyn StdError + 'static),
            "rollback failed, connection will be discarded"
        );
    }
}
