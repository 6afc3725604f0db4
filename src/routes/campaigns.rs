use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::db::queries;
use crate::render;
use crate::services::send_service::{self, SendError};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Response {
    match queries::list_campaigns(&state.pool).await {
        Ok(campaigns) => Json(campaigns).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match queries::get_campaign(&state.pool, id).await {
        Ok(Some(campaign)) => Json(campaign).into_response(),
        Ok(None) => not_found(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub subject: String,
    pub content: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaign>,
) -> Response {
    if req.name.is_empty() || req.subject.is_empty() || req.content.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "name, subject and content are required"})),
        )
            .into_response();
    }
    match queries::create_campaign(&state.pool, &req.name, &req.subject, &req.content).await {
        Ok(id) => Json(json!({"id": id})).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn pending(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match queries::get_campaign(&state.pool, id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(),
        Err(e) => return internal_error(e),
    }
    match queries::pending_contacts(&state.pool, id).await {
        Ok(contacts) => {
            Json(json!({"count": contacts.len(), "contacts": contacts})).into_response()
        }
        Err(e) => internal_error(e),
    }
}

pub async fn not_opened(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match queries::unopened_contacts(&state.pool, id).await {
        Ok(contacts) => Json(contacts).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn preview(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let campaign = match queries::get_campaign(&state.pool, id).await {
        Ok(Some(c)) => c,
        Ok(None) => return not_found(),
        Err(e) => return internal_error(e),
    };
    match render::render_preview(&campaign.content) {
        Ok(body) => Html(format!(
            r#"<!DOCTYPE html>
<html>
<head><title>Preview: {subject}</title></head>
<body style="margin: 0; padding: 20px; background: #f0f0f0;">
    <div style="max-width: 700px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; box-shadow: 0 2px 10px rgba(0,0,0,0.1);">
        <div style="background: #1c1917; color: white; padding: 15px 20px;">
            <strong>Subject:</strong> {subject}
        </div>
        {body}
    </div>
</body>
</html>"#,
            subject = campaign.subject,
        ))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn send(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    // One send invocation at a time; the quota check-then-insert is only
    // sound with a single writer.
    let _guard = state.send_lock.lock().await;
    let limit = crate::settings::daily_limit(
        &state.config.settings_path,
        state.config.default_daily_limit,
    );
    match send_service::send_campaign(
        &state.pool,
        state.verifier.as_ref(),
        state.mailer.as_ref(),
        &state.config.base_url,
        limit,
        id,
    )
    .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => send_error(e),
    }
}

pub async fn resend_unopened(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let _guard = state.send_lock.lock().await;
    let limit = crate::settings::daily_limit(
        &state.config.settings_path,
        state.config.default_daily_limit,
    );
    match send_service::resend_unopened(
        &state.pool,
        state.verifier.as_ref(),
        state.mailer.as_ref(),
        &state.config.base_url,
        limit,
        id,
    )
    .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => send_error(e),
    }
}

#[derive(Deserialize)]
pub struct TestSend {
    pub email: String,
}

pub async fn test_send(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TestSend>,
) -> Response {
    if req.email.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "email is required"})),
        )
            .into_response();
    }
    match send_service::send_test(&state.pool, state.mailer.as_ref(), id, &req.email).await {
        Ok(()) => Json(json!({"success": true})).into_response(),
        Err(e) => send_error(e),
    }
}

fn send_error(e: SendError) -> Response {
    match e {
        SendError::CampaignNotFound => not_found(),
        SendError::QuotaExhausted => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "daily send limit reached", "sent": 0})),
        )
            .into_response(),
        e => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "campaign not found"})),
    )
        .into_response()
}

fn internal_error(e: sqlx::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}
