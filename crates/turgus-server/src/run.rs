use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{Router, response::IntoResponse, routing::get};
use futures::FutureExt;
use turgus_app::rest_api;
use turgus_app::state::{AppConfig, AppState};
use tracing::{debug, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    debug!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn main_router(state: AppState) -> Router<()> {
    Router::new()
        .nest(
            "/products",
            rest_api::product::router().nest("/bookmarks", rest_api::bookmark::router()),
        )
        .with_state(state)
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let pool = turgus_dal::new_pool(&config.database_url()).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Database ready at {}", config.database_url());

    let app_config = AppConfig {
        default_page_size: config.default_page_size,
    };

    Ok(AppState::new(app_config, pool))
}
