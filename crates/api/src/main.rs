//! TenantGate API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tenantgate_api::{
    build_app, AppState, Config, MemoryTenantDirectory, RedisTenantDirectory, TenantDirectory,
};
use tracing_subscriber::EnvFilter;

/// How often expired tenant cache entries are swept
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tenantgate_api=debug,tower_http=info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;

    let directory: Arc<dyn TenantDirectory> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisTenantDirectory::connect(url)
                .await
                .context("failed to connect to the tenant directory")?,
        ),
        None => {
            tracing::warn!("REDIS_URL not set - tenants are kept in memory and lost on restart");
            Arc::new(MemoryTenantDirectory::new())
        }
    };

    let bind_address = config.bind_address.clone();
    tracing::info!(
        root_domain = %config.root_domain,
        directory = directory.backend(),
        policy = ?config.unknown_tenant_policy,
        "Starting TenantGate API"
    );

    let state = AppState::new(config, directory);

    let cache = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = cache.cleanup();
            if removed > 0 {
                tracing::debug!(removed, "Expired tenant cache entries removed");
            }
        }
    });

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    tracing::info!(address = %bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
