use sqlx::SqlitePool;

use crate::models::{Campaign, Contact, EmailRecord, TrackingDetail};

// ---- contacts ----

pub async fn list_contacts(pool: &SqlitePool) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "SELECT * FROM contacts WHERE unsubscribed = 0 ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

/// Insert a contact, ignoring duplicates on email. Returns true if a row was
/// actually inserted.
pub async fn insert_contact(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    company: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO contacts (email, name, company) VALUES (?, ?, ?)")
        .bind(email)
        .bind(name)
        .bind(company)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_unsubscribed(pool: &SqlitePool, contact_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE contacts SET unsubscribed = 1, unsubscribed_at = datetime('now') \
         WHERE id = ? AND unsubscribed = 0",
    )
    .bind(contact_id)
    .execute(pool)
    .await?;
    Ok(())
}

// ---- campaigns ----

pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<Campaign>, sqlx::Error> {
    sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn get_campaign(pool: &SqlitePool, id: i64) -> Result<Option<Campaign>, sqlx::Error> {
    sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create_campaign(
    pool: &SqlitePool,
    name: &str,
    subject: &str,
    content: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO campaigns (name, subject, content) VALUES (?, ?, ?)")
        .bind(name)
        .bind(subject)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

// ---- send eligibility ----

/// Non-unsubscribed contacts with no email record for this campaign, in
/// creation order so repeated invocations walk the list deterministically.
pub async fn pending_contacts(
    pool: &SqlitePool,
    campaign_id: i64,
) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "SELECT c.* FROM contacts c \
         WHERE c.unsubscribed = 0 \
         AND c.id NOT IN (SELECT contact_id FROM emails WHERE campaign_id = ?) \
         ORDER BY c.id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await
}

/// Contacts whose record for this campaign was never opened.
pub async fn unopened_contacts(
    pool: &SqlitePool,
    campaign_id: i64,
) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "SELECT c.* FROM emails e \
         JOIN contacts c ON e.contact_id = c.id \
         WHERE e.campaign_id = ? AND e.opened_at IS NULL AND c.unsubscribed = 0 \
         ORDER BY c.id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await
}

// ---- email records ----

pub async fn insert_email_record(
    pool: &SqlitePool,
    campaign_id: i64,
    contact_id: i64,
    tracking_token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO emails (campaign_id, contact_id, tracking_token, status, sent_at) \
         VALUES (?, ?, ?, 'sent', datetime('now'))",
    )
    .bind(campaign_id)
    .bind(contact_id)
    .bind(tracking_token)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_email_record(
    pool: &SqlitePool,
    campaign_id: i64,
    contact_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM emails WHERE campaign_id = ? AND contact_id = ?")
        .bind(campaign_id)
        .bind(contact_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn records_for_campaign(
    pool: &SqlitePool,
    campaign_id: i64,
) -> Result<Vec<EmailRecord>, sqlx::Error> {
    sqlx::query_as::<_, EmailRecord>("SELECT * FROM emails WHERE campaign_id = ? ORDER BY id")
        .bind(campaign_id)
        .fetch_all(pool)
        .await
}

pub async fn contact_id_for_token(
    pool: &SqlitePool,
    tracking_token: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT contact_id FROM emails WHERE tracking_token = ?")
        .bind(tracking_token)
        .fetch_optional(pool)
        .await
}

/// Emails sent during the current UTC calendar day. Always derived from the
/// table so the count stays exact across restarts.
pub async fn daily_sent_count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM emails WHERE sent_at IS NOT NULL AND date(sent_at) = date('now')",
    )
    .fetch_one(pool)
    .await
}

pub async fn tracking_details(pool: &SqlitePool) -> Result<Vec<TrackingDetail>, sqlx::Error> {
    sqlx::query_as::<_, TrackingDetail>(
        "SELECT e.id, e.campaign_id, e.tracking_token, e.status, e.sent_at, e.opened_at, \
                e.clicked_at, c.email, c.name, c.company \
         FROM emails e \
         JOIN contacts c ON e.contact_id = c.id \
         ORDER BY e.sent_at DESC",
    )
    .fetch_all(pool)
    .await
}

// ---- stats ----

#[derive(Debug, serde::Serialize)]
pub struct Stats {
    pub daily_sent: i64,
    pub daily_limit: i64,
    pub total_sent: i64,
    pub total_opened: i64,
    pub total_clicked: i64,
    pub total_unsubscribed: i64,
}

pub async fn stats(pool: &SqlitePool, daily_limit: i64) -> Result<Stats, sqlx::Error> {
    let total_sent =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM emails WHERE status = 'sent'")
            .fetch_one(pool)
            .await?;
    let total_opened =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM emails WHERE opened_at IS NOT NULL")
            .fetch_one(pool)
            .await?;
    let total_clicked =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM emails WHERE clicked_at IS NOT NULL")
            .fetch_one(pool)
            .await?;
    let total_unsubscribed =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE unsubscribed = 1")
            .fetch_one(pool)
            .await?;
    Ok(Stats {
        daily_sent: daily_sent_count(pool).await?,
        daily_limit,
        total_sent,
        total_opened,
        total_clicked,
        total_unsubscribed,
    })
}
