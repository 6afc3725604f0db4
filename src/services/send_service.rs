//! Send orchestration: walks a campaign's eligible contacts, gates every
//! attempt on the daily quota, verifies deliverability, renders and
//! dispatches, and records the send. One contact's failure never aborts the
//! loop for the rest.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::mailer::{MailTransport, OutgoingEmail};
use crate::models::{Campaign, Contact};
use crate::render;
use crate::verify::Verify;

#[derive(Debug, Serialize)]
pub struct SendOutcome {
    pub sent: i64,
    pub total: i64,
    pub remaining: i64,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("campaign not found")]
    CampaignNotFound,
    /// Quota already exhausted when the invocation started. A soft stop, not
    /// a failure; mapped to 429 at the boundary.
    #[error("daily send limit reached")]
    QuotaExhausted,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Sends a campaign to every eligible contact, stopping early when the daily
/// quota runs out. Eligible = not unsubscribed and no email record for this
/// campaign yet, in contact-creation order.
pub async fn send_campaign(
    pool: &SqlitePool,
    verifier: &dyn Verify,
    mailer: &dyn MailTransport,
    base_url: &str,
    daily_limit: i64,
    campaign_id: i64,
) -> Result<SendOutcome, SendError> {
    let campaign = queries::get_campaign(pool, campaign_id)
        .await?
        .ok_or(SendError::CampaignNotFound)?;

    if queries::daily_sent_count(pool).await? >= daily_limit {
        return Err(SendError::QuotaExhausted);
    }

    let eligible = queries::pending_contacts(pool, campaign_id).await?;
    let total = eligible.len() as i64;

    let mut sent = 0;
    for contact in &eligible {
        // Re-read the count before every attempt; it is derived from the
        // table, so it stays exact even if another campaign sent meanwhile.
        if queries::daily_sent_count(pool).await? >= daily_limit {
            break;
        }
        if send_to_contact(pool, verifier, mailer, base_url, &campaign, contact).await? {
            sent += 1;
        }
    }

    let remaining = (daily_limit - queries::daily_sent_count(pool).await?).max(0);
    Ok(SendOutcome { sent, total, remaining })
}

/// Re-sends to contacts who never opened their email for this campaign. The
/// old record is deleted strictly before the new send so the
/// one-record-per-pair invariant holds even if dispatch fails mid-way (the
/// contact then simply becomes eligible for a plain send again).
pub async fn resend_unopened(
    pool: &SqlitePool,
    verifier: &dyn Verify,
    mailer: &dyn MailTransport,
    base_url: &str,
    daily_limit: i64,
    campaign_id: i64,
) -> Result<SendOutcome, SendError> {
    let campaign = queries::get_campaign(pool, campaign_id)
        .await?
        .ok_or(SendError::CampaignNotFound)?;

    if queries::daily_sent_count(pool).await? >= daily_limit {
        return Err(SendError::QuotaExhausted);
    }

    let unopened = queries::unopened_contacts(pool, campaign_id).await?;
    let total = unopened.len() as i64;

    let mut sent = 0;
    for contact in &unopened {
        if queries::daily_sent_count(pool).await? >= daily_limit {
            break;
        }
        queries::delete_email_record(pool, campaign_id, contact.id).await?;
        if send_to_contact(pool, verifier, mailer, base_url, &campaign, contact).await? {
            sent += 1;
        }
    }

    let remaining = (daily_limit - queries::daily_sent_count(pool).await?).max(0);
    Ok(SendOutcome { sent, total, remaining })
}

/// Single-contact send path shared by both entry points. Returns whether an
/// email record was created. Only database errors propagate; verification
/// rejections, render failures and transport failures are absorbed here so
/// the caller's loop keeps going.
async fn send_to_contact(
    pool: &SqlitePool,
    verifier: &dyn Verify,
    mailer: &dyn MailTransport,
    base_url: &str,
    campaign: &Campaign,
    contact: &Contact,
) -> Result<bool, sqlx::Error> {
    let verification = verifier.verify(&contact.email).await;
    if !verification.accepted {
        // A permanent-looking deliverability failure opts the contact out so
        // dead addresses aren't probed again on every run. Aggressive policy
        // (probes are unreliable); kept deliberately, see DESIGN.md.
        warn!(email = %contact.email, reason = verification.reason.as_str(), "verification failed, unsubscribing contact");
        queries::mark_unsubscribed(pool, contact.id).await?;
        return Ok(false);
    }

    let token = Uuid::new_v4().to_string();
    let html = match render::render_campaign(&campaign.content, contact, base_url, &token) {
        Ok(html) => html,
        Err(e) => {
            warn!(email = %contact.email, error = %e, "template render failed");
            return Ok(false);
        }
    };

    let mail = OutgoingEmail {
        to: contact.email.clone(),
        subject: campaign.subject.clone(),
        html,
        list_unsubscribe: Some(render::unsubscribe_url(base_url, &token)),
    };
    if let Err(e) = mailer.send(&mail).await {
        // Contact keeps no record and stays eligible for a future run.
        warn!(email = %contact.email, error = %e, "dispatch failed");
        return Ok(false);
    }

    queries::insert_email_record(pool, campaign.id, contact.id, &token).await?;
    info!(email = %contact.email, campaign = campaign.id, "email sent");
    Ok(true)
}

/// Test send: placeholder data, visible banner, no verification, no tracking
/// token, nothing persisted.
pub async fn send_test(
    pool: &SqlitePool,
    mailer: &dyn MailTransport,
    campaign_id: i64,
    to: &str,
) -> Result<(), SendError> {
    let campaign = queries::get_campaign(pool, campaign_id)
        .await?
        .ok_or(SendError::CampaignNotFound)?;

    let html = render::render_test(&campaign.content, to)?;
    let mail = OutgoingEmail {
        to: to.to_string(),
        subject: format!("[TEST] {}", campaign.subject),
        html,
        list_unsubscribe: None,
    };
    mailer.send(&mail).await?;
    info!(to = %to, campaign = campaign_id, "test email sent");
    Ok(())
}
