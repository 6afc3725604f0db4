use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::settings::{self, Settings};
use crate::state::AppState;

pub async fn get_settings(State(state): State<AppState>) -> Response {
    let current = settings::load(
        &state.config.settings_path,
        state.config.default_daily_limit,
    );
    Json(current).into_response()
}

#[derive(Deserialize)]
pub struct UpdateSettings {
    pub daily_limit: i64,
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettings>,
) -> Response {
    if !(1..=500).contains(&req.daily_limit) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "daily_limit must be between 1 and 500"})),
        )
            .into_response();
    }
    let updated = Settings {
        daily_limit: req.daily_limit,
    };
    match settings::save(&state.config.settings_path, &updated) {
        Ok(()) => Json(json!({"success": true})).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
