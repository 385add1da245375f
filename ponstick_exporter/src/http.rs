//! HTTP surface: a static landing page and the scrape endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::error;

use crate::state::AppState;

pub const HOME_TEXT: &str = "8311 PON Stick Exporter";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

pub async fn home_handler() -> &'static str {
    HOME_TEXT
}

/// Every request runs a scrape cycle first. Scrape failures never change
/// the status code; only a broken registry does.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.scraper.scrape_and_encode().await {
        Ok((content_type, body)) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!("failed to encode metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
