//! Outbound mail transport. Real delivery goes through lettre's async SMTP
//! transport; the trait seam lets tests substitute a recording stub.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub list_unsubscribe: Option<String>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingEmail) -> Result<()>;
}

/// RFC 2369 List-Unsubscribe header; lettre has no built-in type for it.
#[derive(Debug, Clone)]
struct ListUnsubscribe(String);

impl Header for ListUnsubscribe {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("List-Unsubscribe")
    }

    fn parse(s: &str) -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut builder = match AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host) {
            Ok(b) => b,
            Err(_) => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_host),
        };
        builder = builder.port(cfg.smtp_port);
        if !cfg.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.smtp_username.clone(),
                cfg.smtp_password.clone(),
            ));
        }
        let from: Mailbox = format!("{} <{}>", cfg.sender_name, cfg.sender_email)
            .parse()
            .context("invalid sender address")?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingEmail) -> Result<()> {
        let to: Mailbox = mail.to.parse().context("invalid recipient address")?;
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&mail.subject)
            .header(ContentType::TEXT_HTML);
        if let Some(url) = &mail.list_unsubscribe {
            builder = builder.header(ListUnsubscribe(format!("<{url}>")));
        }
        let message = builder
            .body(mail.html.clone())
            .context("failed to build message")?;
        self.transport
            .send(message)
            .await
            .context("smtp dispatch failed")?;
        Ok(())
    }
}
