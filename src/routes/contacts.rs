use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::db::queries;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Response {
    match queries::list_contacts(&state.pool).await {
        Ok(contacts) => Json(contacts).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// CSV upload. Column names are matched leniently (email/mail/e-mail,
/// name/firstname/nom/prenom, company/entreprise/societe/organization) so
/// exports from common CRMs import without editing.
pub async fn import(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut data: Option<Vec<u8>> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            match field.bytes().await {
                Ok(bytes) => data = Some(bytes.to_vec()),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": e.to_string()})),
                    )
                        .into_response()
                }
            }
        }
    }
    let Some(data) = data else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "file field is required"})),
        )
            .into_response();
    };

    let parsed = parse_contacts(&data);
    let total = parsed.len();
    let mut imported = 0;
    for contact in &parsed {
        match queries::insert_contact(&state.pool, &contact.email, &contact.name, &contact.company)
            .await
        {
            Ok(true) => imported += 1,
            Ok(false) => {} // duplicate email, skipped
            Err(e) => {
                warn!(email = %contact.email, error = %e, "contact insert failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": e.to_string()})),
                )
                    .into_response();
            }
        }
    }

    Json(json!({"imported": imported, "total": total})).into_response()
}

#[derive(Debug, PartialEq)]
pub struct ImportedContact {
    pub email: String,
    pub name: String,
    pub company: String,
}

const EMAIL_COLUMNS: &[&str] = &["email", "mail", "e-mail", "e_mail"];
const NAME_COLUMNS: &[&str] = &["name", "nom", "prenom", "firstname", "first_name"];
const COMPANY_COLUMNS: &[&str] = &[
    "company",
    "entreprise",
    "societe",
    "organization",
    "organisation",
];

pub fn parse_contacts(data: &[u8]) -> Vec<ImportedContact> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_lowercase()).collect(),
        Err(_) => return Vec::new(),
    };

    let find = |candidates: &[&str]| {
        headers
            .iter()
            .position(|h| candidates.contains(&h.as_str()))
    };
    let Some(email_idx) = find(EMAIL_COLUMNS) else {
        return Vec::new();
    };
    let name_idx = find(NAME_COLUMNS);
    let company_idx = find(COMPANY_COLUMNS);

    let mut contacts = Vec::new();
    for record in reader.records().flatten() {
        let Some(email) = record.get(email_idx) else {
            continue;
        };
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            continue;
        }
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        contacts.push(ImportedContact {
            email,
            name: field(name_idx),
            company: field(company_idx),
        });
    }
    contacts
}
