use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_cookies::CookieManagerLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::cache::cache_invalidation_middleware;
use crate::config::Config;
use crate::db::{create_pool, migrations, DbPool};
use crate::handlers;
use crate::state::AppState;

/// Open the database, run migrations and assemble the router.
pub fn build_app(config: Config) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    let db = create_pool(&config.database_path)?;
    build_app_with_pool(db, config)
}

/// Same as [`build_app`] for an already created pool.
pub fn build_app_with_pool(
    db: DbPool,
    config: Config,
) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    {
        let conn = db.get()?;
        let applied = migrations::run_migrations(&conn, &config.migrations_path)?;
        tracing::info!(applied, "Database migrations complete");
    }

    let state = AppState::new(db, config);
    Ok((state.clone(), router(state)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::routes())
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/ping", get(auth::ping))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cache_invalidation_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the router to `host:port` and spawn the server as a tokio task.
///
/// Returns the port actually bound (useful with port 0) and the task handle.
pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
) -> Result<(u16, JoinHandle<()>), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((actual_port, handle))
}
