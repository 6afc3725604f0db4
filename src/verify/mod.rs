//! Deliverability verification: MX lookup plus a live SMTP probe, combined
//! into one accept/reject decision per address.

pub mod mx;
pub mod probe;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use mx::MxCache;
use probe::{Probe, ProbeOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyReason {
    InvalidFormat,
    NoMxRecord,
    SmtpRejected,
    Verified,
    MxOk,
}

impl VerifyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::NoMxRecord => "no_mx_record",
            Self::SmtpRejected => "smtp_rejected",
            Self::Verified => "verified",
            Self::MxOk => "mx_ok",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub accepted: bool,
    pub reason: VerifyReason,
}

impl Verification {
    pub fn accepted(reason: VerifyReason) -> Self {
        Self { accepted: true, reason }
    }

    pub fn rejected(reason: VerifyReason) -> Self {
        Self { accepted: false, reason }
    }
}

#[async_trait]
pub trait Verify: Send + Sync {
    async fn verify(&self, address: &str) -> Verification;
}

pub struct EmailVerifier {
    cache: MxCache,
    probe: Arc<dyn Probe>,
}

impl EmailVerifier {
    pub fn new(cache: MxCache, probe: Arc<dyn Probe>) -> Self {
        Self { cache, probe }
    }
}

#[async_trait]
impl Verify for EmailVerifier {
    /// Malformed addresses are rejected before any network I/O. A missing MX
    /// is a permanent rejection, as is an explicit SMTP refusal of the
    /// mailbox. An indeterminate probe accepts optimistically: many
    /// exchangers refuse RCPT-based probing outright, and suppressing those
    /// recipients would drop legitimate mail.
    async fn verify(&self, address: &str) -> Verification {
        let domain = match address.split('@').nth(1) {
            Some(domain) if !domain.is_empty() => domain,
            _ => return Verification::rejected(VerifyReason::InvalidFormat),
        };

        let exchange = match self.cache.resolve(domain).await {
            Some(exchange) => exchange,
            None => return Verification::rejected(VerifyReason::NoMxRecord),
        };

        match self.probe.classify(&exchange, address).await {
            ProbeOutcome::Invalid => Verification::rejected(VerifyReason::SmtpRejected),
            ProbeOutcome::Valid => Verification::accepted(VerifyReason::Verified),
            ProbeOutcome::Unknown => Verification::accepted(VerifyReason::MxOk),
        }
    }
}
