use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::mailer::MailTransport;
use crate::verify::Verify;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub verifier: Arc<dyn Verify>,
    pub mailer: Arc<dyn MailTransport>,
    /// Serializes send invocations so the quota's check-then-insert pattern
    /// has a single writer.
    pub send_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        config: Config,
        verifier: Arc<dyn Verify>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            verifier,
            mailer,
            send_lock: Arc::new(Mutex::new(())),
        }
    }
}
