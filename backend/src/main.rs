use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wxbot_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::Repositories,
    routes::build_router,
    scheduler::{JobContext, Schedulers},
    services::robot_api::{RobotApi, WxApiClient},
    state::AppState,
};

fn mask_credentials(url: &str) -> String {
    match url.split_once('@') {
        Some((head, tail)) => match head.rsplit_once(':') {
            Some((user, _)) if user.contains("://") => format!("{}:***@{}", user, tail),
            _ => format!("{}@{}", head, tail),
        },
        None => url.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wxbot_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        database_url = %mask_credentials(&config.database_url),
        server = %format!("{}:{}", config.server_host, config.server_port),
        robot_api_timeout_secs = config.robot_api_timeout.as_secs(),
        message_strategy = %config.message_strategy,
        schedulers_enabled = config.scheduler.enabled,
        swagger_enabled = config.swagger_enabled,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let repos = Repositories::postgres(pool);
    let robot_api: Arc<dyn RobotApi> = Arc::new(WxApiClient::new(
        config.robot_api_timeout,
        config.robot_health_timeout,
    )?);

    let schedulers = Schedulers::start(
        JobContext::new(repos.clone(), robot_api.clone()),
        &config.scheduler,
    );

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let app = build_router(AppState::new(repos, robot_api, config));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedulers.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
