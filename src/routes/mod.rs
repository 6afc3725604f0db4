pub mod campaigns;
pub mod contacts;
pub mod settings;
pub mod stats;
pub mod tracking;

use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

async fn root_page() -> impl IntoResponse {
    Html(include_str!("../../static/index.html"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/unsubscribed", get(tracking::unsubscribed_page))
        .nest_service("/static", ServeDir::new("static"))
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route("/api/stats", get(stats::get_stats))
        .route(
            "/api/campaigns",
            get(campaigns::list).post(campaigns::create),
        )
        .route("/api/campaigns/:id", get(campaigns::get_one))
        .route("/api/campaigns/:id/pending", get(campaigns::pending))
        .route("/api/campaigns/:id/not-opened", get(campaigns::not_opened))
        .route("/api/campaigns/:id/preview", get(campaigns::preview))
        .route("/api/campaigns/:id/send", post(campaigns::send))
        .route(
            "/api/campaigns/:id/resend-unopened",
            post(campaigns::resend_unopened),
        )
        .route("/api/campaigns/:id/test", post(campaigns::test_send))
        .route("/api/contacts", get(contacts::list))
        .route("/api/contacts/import", post(contacts::import))
        .route("/api/tracking-details", get(tracking::details))
        .route("/track/open/:token", get(tracking::open_pixel))
        .route("/track/click/:token", get(tracking::click))
        .route("/unsubscribe/:token", get(tracking::unsubscribe))
}
