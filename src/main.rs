use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hobby_mentor::config::AppConfig;
use hobby_mentor::llm::{LlmProvider, RetryProvider, create_provider};
use hobby_mentor::mentor::{MentorManager, build_app, spawn_expiry_task};
use hobby_mentor::store::{InMemorySessionStore, SessionStore};

/// How often idle sessions are swept when expiry is enabled.
const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing; the guard flushes the log file on exit
    let _log_guard = init_tracing(config.server.log_dir.as_deref());

    let addr = config.server.addr()?;
    eprintln!("🎯 Hobby Mentor v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", config.llm.model, config.llm.backend);
    eprintln!("   Chat API: http://{}/api/chat", addr);
    eprintln!("   Suggestions per session: {}", config.mentor.suggestion_cap);
    match &config.server.static_dir {
        Some(dir) => eprintln!("   Frontend: {}", dir.display()),
        None => eprintln!("   Frontend: disabled"),
    }

    // ── LLM ──────────────────────────────────────────────────────────────
    let llm = create_provider(&config.llm)?;
    let llm: Arc<dyn LlmProvider> = Arc::new(RetryProvider::new(llm, config.retry.clone()));

    // ── Mentor ───────────────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let manager = Arc::new(MentorManager::new(store, llm, &config.mentor));

    let _expiry_handle = match config.mentor.session_idle {
        Some(max_idle) => {
            eprintln!("   Session expiry: after {}s idle", max_idle.as_secs());
            Some(spawn_expiry_task(Arc::clone(&manager), max_idle, IDLE_SWEEP_INTERVAL))
        }
        None => {
            eprintln!("   Session expiry: disabled");
            None
        }
    };

    // ── HTTP ─────────────────────────────────────────────────────────────
    let app = build_app(manager, config.server.static_dir.as_deref());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Hobby Mentor server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Stderr logging filtered by `RUST_LOG`, plus a daily rolling file when
/// `log_dir` is set.
fn init_tracing(
    log_dir: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "hobby-mentor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
