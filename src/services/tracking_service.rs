//! Inbound tracking events. Every operation is idempotent: timestamps are
//! first-write-wins via an explicit compare-and-set inside a transaction, and
//! unknown tokens are silent no-ops so callers can't distinguish real tokens
//! from guesses.

use sqlx::SqlitePool;
use tracing::debug;

/// Records the first open for a tracking token. Later opens are no-ops.
pub async fn record_open(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    set_once(pool, token, "opened_at").await
}

/// Records the first click for a tracking token. Later clicks are no-ops.
pub async fn record_click(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    set_once(pool, token, "clicked_at").await
}

async fn set_once(pool: &SqlitePool, token: &str, column: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let current: Option<Option<String>> = sqlx::query_scalar(&format!(
        "SELECT {column} FROM emails WHERE tracking_token = ?"
    ))
    .bind(token)
    .fetch_optional(&mut *tx)
    .await?;

    match current {
        Some(None) => {
            sqlx::query(&format!(
                "UPDATE emails SET {column} = datetime('now') \
                 WHERE tracking_token = ? AND {column} IS NULL"
            ))
            .bind(token)
            .execute(&mut *tx)
            .await?;
        }
        Some(Some(_)) => {} // already recorded, first write wins
        None => debug!(token = %token, "tracking hit for unknown token"),
    }
    tx.commit().await
}

/// Resolves a token to its contact and opts the contact out. Unknown tokens
/// do nothing; the caller shows the same confirmation either way.
pub async fn unsubscribe(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    let contact_id = crate::db::queries::contact_id_for_token(pool, token).await?;
    if let Some(id) = contact_id {
        crate::db::queries::mark_unsubscribed(pool, id).await?;
    } else {
        debug!(token = %token, "unsubscribe for unknown token");
    }
    Ok(())
}
