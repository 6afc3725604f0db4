use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::queries;
use crate::settings;
use crate::state::AppState;

pub async fn get_stats(State(state): State<AppState>) -> Response {
    let limit = settings::daily_limit(
        &state.config.settings_path,
        state.config.default_daily_limit,
    );
    match queries::stats(&state.pool, limit).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
