use serde::{Deserialize, Serialize};

/// A campaign's content is immutable once created; sends are tracked through
/// the `emails` table rather than by mutating the campaign row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub subject: String,
    /// Raw Handlebars HTML body.
    pub content: String,
    pub status: String,
    pub created_at: Option<String>,
    pub sent_at: Option<String>,
}
