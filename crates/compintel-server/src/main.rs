mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use compintel_gamification::{GamificationTriggers, PgStatsStore, RemoteGamificationClient};
use compintel_monitor::{MonitorConfig, MonitorRegistry};
use compintel_pipeline::{
    JobProcessor, MonitoringScheduler, PgStore, PipelineStores, ProcessorConfig,
};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(compintel_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = compintel_db::PoolConfig::from_app_config(&config);
    let pool = compintel_db::connect_pool(&config.database_url, pool_config).await?;
    compintel_db::run_migrations(&pool).await?;

    let remote = match &config.gamification_url {
        Some(url) => Some(RemoteGamificationClient::new(
            url,
            config.gamification_token.clone(),
            config.monitor_request_timeout_secs,
        )?),
        None => None,
    };
    let triggers = GamificationTriggers::new(remote, Arc::new(PgStatsStore::new(pool.clone())));

    let monitors = MonitorRegistry::with_default_monitors(
        &MonitorConfig::from_app_config(&config),
        &config.platform_keys,
    )?;
    tracing::info!(platforms = ?monitors.platforms(), "monitor registry ready");

    let stores = PipelineStores::shared(Arc::new(PgStore::new(pool.clone())));
    let monitoring = MonitoringScheduler::new(
        Arc::clone(&stores.jobs),
        Arc::clone(&stores.directory),
        config.max_retries,
    )
    .with_triggers(triggers.clone());
    let processor = Arc::new(JobProcessor::new(
        stores,
        monitors,
        triggers.clone(),
        ProcessorConfig::from_app_config(&config),
    ));

    let mut jobs =
        scheduler::build_scheduler(processor, monitoring.clone(), Arc::clone(&config)).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        compintel_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        scheduler: monitoring,
        triggers,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "compintel-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    jobs.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
