use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::db::queries;
use crate::services::tracking_service;
use crate::state::AppState;

/// 1x1 transparent GIF.
const TRANSPARENT_PIXEL: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

/// Always serves the pixel, even for unknown or already-counted tokens, so
/// mail clients never see an error.
pub async fn open_pixel(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    if let Err(e) = tracking_service::record_open(&state.pool, &token).await {
        warn!(token = %token, error = %e, "open tracking failed");
    }
    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (
                header::CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, private",
            ),
        ],
        TRANSPARENT_PIXEL,
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct ClickQuery {
    pub url: Option<String>,
}

/// Records the click and redirects unconditionally, falling back to the
/// configured base URL when no target was given or the target can't be put
/// in a Location header.
pub async fn click(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<ClickQuery>,
) -> Response {
    if let Err(e) = tracking_service::record_click(&state.pool, &token).await {
        warn!(token = %token, error = %e, "click tracking failed");
    }
    let target = redirect_target(query.url, &state.config.base_url);
    Redirect::temporary(&target).into_response()
}

/// The query string is attacker-controlled and percent-decoded, so a value
/// with control characters would not be a valid header value and
/// `Redirect::temporary` would panic on it. Such targets fall back too.
fn redirect_target(url: Option<String>, fallback: &str) -> String {
    url.filter(|u| header::HeaderValue::try_from(u.as_str()).is_ok())
        .unwrap_or_else(|| fallback.to_string())
}

/// Same confirmation page whether the token was known or not, so the
/// endpoint leaks nothing about which tokens exist.
pub async fn unsubscribe(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    if let Err(e) = tracking_service::unsubscribe(&state.pool, &token).await {
        warn!(token = %token, error = %e, "unsubscribe failed");
    }
    Redirect::temporary("/unsubscribed").into_response()
}

pub async fn unsubscribed_page() -> impl IntoResponse {
    Html(include_str!("../../static/unsubscribed.html"))
}

pub async fn details(State(state): State<AppState>) -> Response {
    match queries::tracking_details(&state.pool).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
