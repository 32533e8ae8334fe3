//! HTTP trigger endpoint.
//!
//! The browser front end and scanner scripts poke the controller over plain
//! HTTP.  Every route only enqueues a [`Command`]; the dispatcher does the
//! work.
//!
//! | Route                          | Command           | Response                          |
//! |--------------------------------|-------------------|-----------------------------------|
//! | `GET /health`                  | –                 | `{"ok": true}`                    |
//! | `POST /check_pdf`              | `check-folder`    | `{"queued": true}`                |
//! | `GET /set_user_id?user_id=ID`  | `set-user-id(ID)` | `{"success": true, "user_id": ID}`|
//!
//! Once shutdown has started, enqueueing routes answer `503`.

use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use transcribe_core::Command;

use crate::bus::{BusError, CommandSender, Shutdown};

/// Error body returned by the API.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Unavailable(BusError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            ApiError::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SetUserIdParams {
    user_id: Option<String>,
}

/// Builds the router.  `cors_origin` is the single origin allowed to call
/// the API from a browser.
pub fn router(commands: CommandSender, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/check_pdf", post(check_pdf))
        .route("/set_user_id", get(set_user_id))
        .layer(cors_layer(cors_origin))
        .with_state(commands)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allowed: Vec<HeaderValue> = match origin.parse() {
        Ok(value) => vec![value],
        Err(_) => {
            warn!("ignoring invalid CORS origin '{origin}'; cross-origin requests will be refused");
            Vec::new()
        }
    };
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn check_pdf(State(commands): State<CommandSender>) -> Result<Json<Value>, ApiError> {
    commands
        .push(Command::CheckFolder)
        .map_err(ApiError::Unavailable)?;
    info!("folder check requested over HTTP");
    Ok(Json(json!({ "queued": true })))
}

async fn set_user_id(
    State(commands): State<CommandSender>,
    Query(params): Query<SetUserIdParams>,
) -> Result<Json<Value>, ApiError> {
    let user_id = params
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("user_id query parameter is required"))?;

    commands
        .push(Command::SetUserId(user_id.clone()))
        .map_err(ApiError::Unavailable)?;
    Ok(Json(json!({ "success": true, "user_id": user_id })))
}

/// Binds the listener.  Done before spawning so bind errors are fatal at
/// startup.
pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serves `app` until `shutdown` is triggered, then drains in-flight
/// requests.
pub async fn serve(listener: TcpListener, app: Router, shutdown: Shutdown) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.triggered().await })
        .await?;
    info!("HTTP API stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
