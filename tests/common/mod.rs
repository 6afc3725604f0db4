#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use openmailer::mailer::{MailTransport, OutgoingEmail};
use openmailer::verify::{Verification, Verify, VerifyReason};

/// In-memory database with the full schema. Single connection, since each
/// `sqlite::memory:` connection is its own database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::query(include_str!("../../migrations/0001_init.sql"))
        .execute(&pool)
        .await
        .expect("apply schema");
    pool
}

pub async fn seed_contact(pool: &SqlitePool, email: &str, name: &str) -> i64 {
    let result = sqlx::query("INSERT INTO contacts (email, name, company) VALUES (?, ?, 'Acme')")
        .bind(email)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    result.last_insert_rowid()
}

pub async fn seed_campaign(pool: &SqlitePool, name: &str) -> i64 {
    let result = sqlx::query(
        "INSERT INTO campaigns (name, subject, content) \
         VALUES (?, 'Hello {{name}}', '<p>Hi {{name}}</p>{{{trackingLogo}}}')",
    )
    .bind(name)
    .execute(pool)
    .await
    .unwrap();
    result.last_insert_rowid()
}

/// Verifier stub: accepts everything except an explicit reject list.
pub struct StaticVerifier {
    rejected: Vec<String>,
    reason: VerifyReason,
}

impl StaticVerifier {
    pub fn accept_all() -> Self {
        Self {
            rejected: Vec::new(),
            reason: VerifyReason::SmtpRejected,
        }
    }

    pub fn rejecting(emails: &[&str], reason: VerifyReason) -> Self {
        Self {
            rejected: emails.iter().map(|e| e.to_string()).collect(),
            reason,
        }
    }
}

#[async_trait]
impl Verify for StaticVerifier {
    async fn verify(&self, address: &str) -> Verification {
        if self.rejected.iter().any(|e| e == address) {
            Verification::rejected(self.reason)
        } else {
            Verification::accepted(VerifyReason::MxOk)
        }
    }
}

/// Transport stub that records what it was asked to send and can simulate
/// dispatch failures for specific recipients.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail_for: Vec<String>,
}

impl RecordingMailer {
    pub fn failing_for(emails: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: emails.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub async fn sent_to(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.to.clone()).collect()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: &OutgoingEmail) -> anyhow::Result<()> {
        if self.fail_for.iter().any(|e| e == &mail.to) {
            anyhow::bail!("simulated transport failure");
        }
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }
}
