#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use taskhub_server::{
    build_router, validate_startup_config_contract, ApiConfig, AppState, AuthConfig,
};
use taskhub_store::{LocalFsBlobStore, SqliteStore};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool(taskhub_core::ENV_TASKHUB_LOG_JSON, true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn api_config_from_env() -> ApiConfig {
    let defaults = ApiConfig::default();
    let auth_defaults = AuthConfig::default();
    ApiConfig {
        max_body_bytes: env_usize("TASKHUB_MAX_BODY_BYTES", defaults.max_body_bytes),
        max_upload_bytes: env_usize("TASKHUB_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        search_limit: env_usize("TASKHUB_SEARCH_LIMIT", defaults.search_limit),
        shutdown_drain: env_duration_ms(
            "TASKHUB_SHUTDOWN_DRAIN_MS",
            defaults.shutdown_drain.as_millis() as u64,
        ),
        auth: AuthConfig {
            jwt_secret: env::var("TASKHUB_JWT_SECRET").unwrap_or_default(),
            jwt_issuer: env::var("TASKHUB_JWT_ISSUER").unwrap_or(auth_defaults.jwt_issuer),
            token_ttl: Duration::from_secs(env_u64(
                "TASKHUB_JWT_TTL_SECS",
                auth_defaults.token_ttl.as_secs(),
            )),
            min_password_chars: env_usize(
                "TASKHUB_MIN_PASSWORD_CHARS",
                auth_defaults.min_password_chars,
            ),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("TASKHUB_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let db_path = PathBuf::from(
        env::var("TASKHUB_DB_PATH").unwrap_or_else(|_| "data/taskhub.sqlite".to_string()),
    );
    let upload_root = PathBuf::from(
        env::var("TASKHUB_UPLOAD_ROOT").unwrap_or_else(|_| "data/uploads".to_string()),
    );

    let api_cfg = api_config_from_env();
    validate_startup_config_contract(&api_cfg)?;
    if api_cfg.auth.has_weak_secret() {
        warn!("TASKHUB_JWT_SECRET is shorter than 32 bytes; use a longer random secret");
    }

    std::fs::create_dir_all(&upload_root)
        .map_err(|e| format!("create upload root {} failed: {e}", upload_root.display()))?;
    let store = SqliteStore::open(&db_path)
        .map_err(|e| format!("open database {} failed: {e}", db_path.display()))?;
    info!(db = %db_path.display(), uploads = %upload_root.display(), "storage ready");

    let drain = api_cfg.shutdown_drain;
    let state = AppState::new(
        api_cfg,
        Arc::new(store),
        Arc::new(LocalFsBlobStore::new(upload_root)),
    );
    let app = build_router(state);

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("taskhub-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!(drain_ms = drain.as_millis() as u64, "shutdown requested; draining");
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
