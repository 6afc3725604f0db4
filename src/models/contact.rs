use serde::{Deserialize, Serialize};

/// A mailing-list recipient. Contacts are created by CSV import and only ever
/// soft-deleted via the `unsubscribed` flag.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub unsubscribed: bool,
    pub unsubscribed_at: Option<String>,
    pub created_at: Option<String>,
}
