//! Health, config, and stats endpoints.

use axum::extract::State;
use axum::Json;

use crate::rest::dto::{ConfigResponse, HealthResponse};
use crate::rest::error::ApiError;
use crate::rest::state::ApiState;
use crate::session::manager::SessionStats;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.uptime_seconds(),
        oauth_enabled: false,
    })
}

#[utoipa::path(
    get,
    path = "/config",
    tag = "Config",
    responses((status = 200, description = "Sanitized configuration", body = ConfigResponse))
)]
pub async fn config(State(state): State<ApiState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        tenant_id: state.config.tenant_id.clone(),
        port: state.config.port,
        session_timeout_minutes: state.config.session_timeout_minutes,
        default_branch: state.config.default_branch.clone(),
        create_branches: state.config.create_branches,
        max_concurrent_sessions: state.config.max_concurrent_sessions,
        boss_agent_enabled: state.config.boss_agent.enabled,
    })
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Stats",
    responses((status = 200, description = "Per-status session counts", body = SessionStats))
)]
pub async fn stats(State(state): State<ApiState>) -> Result<Json<SessionStats>, ApiError> {
    let stats = state.sessions.get_stats().await?;
    Ok(Json(stats))
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

    fn build_state(temp: &TempDir) -> ApiState {
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
            default_branch: "main".to_string(),
            create_branches: false,
            webhook_secret: None,
            max_concurrent_sessions: 16,
            state_dir: PathBuf::from(".bridge"),
            cleanup_max_age_days: 7,
            boss_agent: BossAgentConfig::default(),
            logging: Default::default(),
            cors_origins: Vec::new(),
        });
        let manager = SessionManager::new(store, worktree_manager, executor, None, config.clone(), temp.path().to_path_buf());
        ApiState::new(manager, config, None)
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        let Json(response) = health(State(state)).await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_config_never_leaks_token() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        let Json(response) = config(State(state)).await;
        assert_eq!(response.tenant_id, "tenant");
    }

    #[tokio::test]
    async fn test_stats_starts_empty() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        let Json(response) = stats(State(state)).await.unwrap();
        assert_eq!(response.created, 0);
    }
}
