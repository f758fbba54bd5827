//! HTTP side of the bot: ad watch page, reward callback and admin panel.
//!
//! Served on `PORT` next to the dispatcher; in webhook mode the Telegram
//! update route is merged into the same router.

mod admin;
mod export;
mod watch;

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::bot::dispatcher::{AppState, ThrottledBot};

/// State shared by all web handlers.
#[derive(Clone)]
pub struct WebState {
    pub app: AppState,
    /// Used to notify users about web-side events.
    pub bot: ThrottledBot,
}

/// Build the web router.
pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/watch", get(watch::watch_page))
        .route("/reward", get(watch::reward))
        .route("/admin", get(admin::panel))
        .route("/admin/withdrawals/:id/approve", post(admin::approve_withdraw))
        .route("/admin/withdrawals/:id/reject", post(admin::reject_withdraw))
        .route("/admin/ads", post(admin::create_ad))
        .route("/admin/ads/:id/toggle", post(admin::toggle_ad))
        .route("/admin/ads/:id/delete", post(admin::delete_ad))
        .route("/admin/quizzes", post(admin::create_quiz))
        .route("/admin/quizzes/:id/delete", post(admin::delete_quiz))
        .route("/admin/export/users.csv", get(export::users_csv))
        .route("/admin/export/withdrawals.csv", get(export::withdrawals_csv))
        .with_state(state)
}

/// Serve the router until the process stops.
pub async fn serve(address: SocketAddr, router: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("🌐 Web server listening on http://{}", address);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Errors rendered as plain HTML pages.
#[derive(Debug)]
pub enum WebError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized!".to_string()),
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            WebError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Html(crate::utils::html_escape(&message))).into_response()
    }
}

impl From<mongodb::error::Error> for WebError {
    fn from(e: mongodb::error::Error) -> Self {
        error!("Database error in web handler: {}", e);
        WebError::Internal("Database error".to_string())
    }
}

impl From<crate::rewards::RewardError> for WebError {
    fn from(e: crate::rewards::RewardError) -> Self {
        error!("Reward error in web handler: {}", e);
        WebError::Internal(e.to_string())
    }
}
