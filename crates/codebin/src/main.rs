//! Codebin - a small snippet-sharing service

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use codebin_api::{AppState, create_router};
use codebin_auth::{AuthService, JwtManager};
use codebin_core::{SnippetService, TtlCache, spawn_cleanup_task};
use codebin_db::Database;
use config::{Config, LoggingConfig};

/// Codebin - a small snippet-sharing service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "CODEBIN_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "CODEBIN_PORT")]
    port: Option<u16>,

    /// Environment name (development|staging|production)
    #[arg(long, env = "CODEBIN_ENV")]
    env: Option<String>,

    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Secret used to sign session tokens
    #[arg(long, env = "CODEBIN_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

impl Args {
    /// Command line and environment take precedence over the file
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(env) = self.env {
            config.server.environment = env;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(secret) = self.jwt_secret {
            config.auth.jwt_secret = secret;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone();
    let file_config = Config::from_file(&config_path)?;
    let found = file_config.is_some();
    let mut config = file_config.unwrap_or_default();
    args.apply(&mut config);

    init_logging(&config.logging);

    info!("Starting Codebin v{}", env!("CARGO_PKG_VERSION"));
    if found {
        info!("Loaded configuration from {}", config_path);
    } else {
        info!("Config file not found at {}, using defaults", config_path);
    }

    config.validate()?;

    // Initialize database
    create_sqlite_parent_dir(&config.database.url).await?;
    let db = Arc::new(Database::new(&config.database.url).await?);

    // Initialize JWT manager
    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_hours,
    )?);

    // Initialize snippet cache
    let cache_config = codebin_core::CacheConfig {
        ttl: cache_ttl(config.cache.ttl_secs)?,
        max_entries: config.cache.max_entries,
    };
    let cache = Arc::new(TtlCache::new(cache_config));
    let _cleanup_handle = spawn_cleanup_task(
        cache.clone(),
        std::time::Duration::from_secs(config.cache.cleanup_interval_secs),
    );

    let snippets = Arc::new(SnippetService::new(db.clone(), cache));
    let auth = AuthService::new(db, jwt);

    let state = AppState::new(snippets, auth, config.server.environment.clone());

    // Install the Prometheus recorder before any counter fires
    let metrics_handle = if config.metrics.enabled {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    let static_dir = Path::new(&config.server.static_dir);
    let static_dir = if config.server.static_dir.is_empty() {
        None
    } else if static_dir.is_dir() {
        Some(static_dir)
    } else {
        warn!(
            "Static directory {} not found, serving API only",
            config.server.static_dir
        );
        None
    };

    // Create router
    let mut app = create_router(state, metrics_handle, static_dir);
    if !config.server.allowed_origins.is_empty() {
        app = app.layer(cors_layer(&config.server.allowed_origins)?);
    }

    // Determine bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind_address, config.server.port
            )
        })?;

    info!(
        "Listening on {} ({} environment)",
        addr, config.server.environment
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Create the directory holding a file-backed SQLite database
async fn create_sqlite_parent_dir(url: &str) -> Result<()> {
    let Some(path) = url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}

/// Cache TTL from seconds, rejecting values chrono cannot represent
fn cache_ttl(secs: u64) -> Result<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .with_context(|| format!("cache.ttl_secs {} is too large", secs))
}

/// CORS policy for the configured origins
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
