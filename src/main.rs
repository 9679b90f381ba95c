//! 발송지연 처리 — multi-store dispatch-delay web tool.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use dispatch_delay::{accounts, build_http_client, server, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    std::fs::create_dir_all("logs").context("creating logs directory")?;
    let file_appender = tracing_appender::rolling::daily("logs", "dispatch-delay.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    info!("═══════════════════════════════════════════════════");
    info!("  📦 발송지연 처리 — Multi-Store Dispatch Delay");
    info!("═══════════════════════════════════════════════════");

    let settings = Settings::from_env();
    let http = build_http_client(settings.request_timeout_secs)
        .context("building HTTP client")?;

    let accounts = accounts::load_accounts(&http, &settings)
        .await
        .context("마켓 정보 로드 실패 — check credential settings in .env")?;
    if accounts.is_empty() {
        anyhow::bail!("credential source has no usable account rows");
    }
    info!("✅ 연동된 마켓: {}개", accounts.len());

    let addr: std::net::SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR '{}'", settings.bind_addr))?;

    let state = AppState {
        settings: Arc::new(settings),
        accounts: Arc::new(accounts),
        http,
    };
    server::serve(state, addr).await
}
