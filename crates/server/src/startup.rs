use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::auth::domain::CreateAdminInput;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Connect, migrate and assemble the shared state.
pub async fn prepare_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    common::env::ensure_env(&cfg.uploads.dir, cfg.database.sqlite_path().as_deref()).await?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    models::db::migrate(&db)
        .await
        .map_err(|e| StartupError::Database(format!("migration failed: {e}")))?;

    let state = ServerState::new(db, cfg);

    if let Some(admin) = &cfg.auth.bootstrap_admin {
        let input = CreateAdminInput {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
        };
        let created = state
            .auth
            .ensure_bootstrap_admin(input)
            .await
            .map_err(|e| StartupError::InvalidConfig(format!("bootstrap admin: {e}")))?;
        if created {
            info!(email = %admin.email, "bootstrap admin created");
        }
    } else if cfg.auth.jwt_secret == configs::DEV_JWT_SECRET {
        warn!("no bootstrap admin configured and development JWT secret in use");
    }

    Ok(state)
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
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
    info!("shutdown signal received");
}

/// Public entry: build the app and run the HTTP server until a shutdown signal.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let state = prepare_state(&cfg).await?;
    let app = build_app(state);

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, upload_dir = %cfg.uploads.dir.display(), "starting bus admin server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    info!("server stopped");
    Ok(())
}
