use serde::{Deserialize, Serialize};

/// Links one campaign to one contact. At most one row exists per
/// (campaign_id, contact_id) pair at any time; `opened_at` and `clicked_at`
/// are first-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailRecord {
    pub id: i64,
    pub campaign_id: i64,
    pub contact_id: i64,
    pub tracking_token: String,
    pub status: String,
    pub sent_at: Option<String>,
    pub opened_at: Option<String>,
    pub clicked_at: Option<String>,
}

/// An email record joined with its contact, for the tracking dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrackingDetail {
    pub id: i64,
    pub campaign_id: i64,
    pub tracking_token: String,
    pub status: String,
    pub sent_at: Option<String>,
    pub opened_at: Option<String>,
    pub clicked_at: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
}
