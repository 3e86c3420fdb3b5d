//! REST API: webhook ingestion plus a small admin surface over session state.

use anyhow::Result;
use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_credentials(true)
        .allow_methods([axum::http::Method::GET, axum::http::Method::DELETE, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION])
}

/// Build the API router with all routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/config", get(routes::health::config))
        .route("/stats", get(routes::health::stats))
        .route("/sessions", get(routes::sessions::list))
        .route("/sessions/active", get(routes::sessions::list_active))
        .route("/sessions/:id", get(routes::sessions::get_one))
        .route("/sessions/:id", delete(routes::sessions::cancel))
        .route("/webhooks/linear", post(routes::webhooks::linear))
        .route("/webhooks/codegen/:task_id", post(routes::webhooks::codegen))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the router, shutting down gracefully on ctrl-c.
pub async fn serve(state: ApiState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BossAgentConfig, Config};
    use crate::executor::{Executor, NullExecutor};
    use crate::git::WorktreeManager;
    use crate::session::store::{InMemorySessionStore, SessionStore};
    use crate::session::SessionManager;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_build_router() {
        let temp = TempDir::new().unwrap();
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let worktree_manager = Arc::new(WorktreeManager::new(temp.path().join("worktrees")));
        let executor: Arc<dyn Executor> = Arc::new(NullExecutor);
        let config = Arc::new(Config {
            api_token: "t".to_string(),
            tenant_id: "tenant".to_string(),
            project_root: temp.path().to_path_buf(),
            agent_user_id: None,
            port: 3005,
            session_timeout_minutes: 30,
            create_branches: false,
            default_branch: "main".to_string(),
            webhook_secret: None,
            max_concurrent_sessions: 16,
            state_dir: PathBuf::from(".bridge"),
            cleanup_max_age_days: 7,
            boss_agent: BossAgentConfig::default(),
            logging: Default::default(),
            cors_origins: vec!["https://example.com".to_string()],
        });
        let manager = SessionManager::new(store, worktree_manager, executor, None, config.clone(), temp.path().to_path_buf());
        let state = ApiState::new(manager, config, None);
        let _router = build_router(state);
    }
}
