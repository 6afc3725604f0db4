use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use openmailer::config::Config;
use openmailer::mailer::SmtpMailer;
use openmailer::state::AppState;
use openmailer::verify::mx::{DnsMxLookup, MxCache};
use openmailer::verify::probe::TcpProbe;
use openmailer::verify::EmailVerifier;
use openmailer::{db, routes};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,openmailer=debug")),
        )
        .init();

    let config = Config::from_env();

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let lookup = Arc::new(DnsMxLookup::from_system_conf()?);
    let probe = Arc::new(TcpProbe::new(&config.probe_helo, &config.probe_mail_from));
    let verifier = Arc::new(EmailVerifier::new(MxCache::new(lookup), probe));
    let mailer = Arc::new(SmtpMailer::from_config(&config)?);

    let daily_limit = config.default_daily_limit;
    let state = AppState::new(pool, config, verifier, mailer);
    let app = routes::routes().with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, daily_limit, "openmailer listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let term = async {
        if let Ok(mut s) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            s.recv().await;
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();
    tokio::select! { _ = ctrl_c => {}, _ = term => {} }
}
