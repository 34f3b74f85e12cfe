//! HTTP surface — welcome delivery endpoint and health check.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use arbolito_core::{
    config::WelcomeConfig, message::OutboundMessage, recipient::RecipientId, traits::Messenger,
};
use arbolito_delivery::{ack, dispatcher, resolver};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub messenger: Arc<dyn Messenger>,
    pub welcome: WelcomeConfig,
    pub ack_window: Duration,
    pub started: std::time::Instant,
}

/// Welcome request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendWelcomeRequest {
    phone_number: Option<String>,
    video_path: Option<String>,
}

/// `GET /health` — liveness plus messaging-client state.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    let whatsapp = if state.messenger.is_ready().await {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({
        "status": "ok",
        "whatsapp": whatsapp,
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

/// `POST /send-welcome` — normalize, resolve, dispatch the welcome message.
///
/// Responds as soon as the send is accepted; the acknowledgement wait runs
/// in the background and only logs its outcome. A missing ack is not a
/// delivery failure from the caller's point of view.
async fn send_welcome(
    State(state): State<ApiState>,
    body: Result<Json<SendWelcomeRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": format!("invalid request: {e}")})),
        )
    })?;

    let phone = match request.phone_number.as_deref() {
        Some(p) if !p.trim().is_empty() => p,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "error": "phoneNumber is required"})),
            ));
        }
    };

    if !state.messenger.is_ready().await {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"success": false, "error": "messaging client not ready"})),
        ));
    }

    let recipient = RecipientId::normalize(phone).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": e.to_string()})),
        )
    })?;

    // A lookup failure never blocks the send; we proceed with the
    // original id as a best-effort target.
    let resolution = match resolver::resolve(state.messenger.as_ref(), &recipient).await {
        Ok(resolution) => resolution,
        Err(e) => {
            warn!(recipient = %recipient, error = %e, "recipient lookup failed, proceeding anyway");
            resolver::Resolution::Unresolved
        }
    };
    let target = resolution.target(&recipient).to_string();

    let video_path = request
        .video_path
        .clone()
        .or_else(|| state.welcome.video_path.clone())
        .map(PathBuf::from);
    let message = match video_path {
        Some(path) => OutboundMessage::with_media(recipient.clone(), &state.welcome.text, path),
        None => OutboundMessage::text(recipient.clone(), &state.welcome.text),
    };

    // Subscribe before dispatching so the ack cannot slip past the waiter.
    let ack_rx = state.messenger.ack_events();

    let handle = dispatcher::dispatch(state.messenger.as_ref(), &target, &message)
        .await
        .map_err(|e| {
            error!(target, error = %e, "welcome dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            )
        })?;

    info!(target, handle = %handle, "welcome message sent");

    let window = state.ack_window;
    tokio::spawn(async move {
        match ack::await_server_ack(ack_rx, &handle, window).await {
            ack::AckOutcome::Satisfied(level) => {
                info!(handle = %handle, ?level, "welcome delivery confirmed");
            }
            ack::AckOutcome::TimedOut => {
                warn!(handle = %handle, "welcome delivery unconfirmed after {}s", window.as_secs());
            }
        }
    });

    Ok(Json(json!({
        "success": true,
        "message": "Message sent successfully",
    })))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/send-welcome", post(send_welcome))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// Start the API server.
pub async fn serve(state: ApiState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
