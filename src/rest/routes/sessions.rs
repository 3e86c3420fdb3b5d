//! Session inspection and cancellation routes.

use axum::extract::{Path, State};
use axum::Json;

use crate::rest::dto::SessionListResponse;
use crate::rest::error::ApiError;
use crate::rest::state::ApiState;
use crate::session::Session;

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "Sessions",
    responses((status = 200, description = "All known sessions", body = SessionListResponse))
)]
pub async fn list(State(state): State<ApiState>) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.sessions.list_sessions().await?;
    Ok(Json(SessionListResponse { sessions }))
}

#[utoipa::path(
    get,
    path = "/sessions/active",
    tag = "Sessions",
    responses((status = 200, description = "Sessions in CREATED or RUNNING", body = SessionListResponse))
)]
pub async fn list_active(State(state): State<ApiState>) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.sessions.list_active_sessions().await?;
    Ok(Json(SessionListResponse { sessions }))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "Sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session found", body = Session),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn get_one(State(state): State<ApiState>, Path(id): Path<String>) -> Result<Json<Session>, ApiError> {
    let session = state.sessions.get_session(&id).await?.ok_or_else(|| ApiError::NotFound(format!("session '{id}' not found")))?;
    Ok(Json(session))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "Sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Cancellation requested"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn cancel(State(state): State<ApiState>, Path(id): Path<String>) -> Result<(), ApiError> {
    if state.sessions.get_session(&id).await?.is_none() {
        return Err(ApiError::NotFound(format!("session '{id}' not found")));
    }
    state.sessions.cancel_session(&id).await?;
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
    use crate::types::Issue;
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
            create_branches: false,
            default_branch: "main".to_string(),
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

    fn sample_issue() -> Issue {
        Issue {
            id: "i1".to_string(),
            identifier: "ENG-1".to_string(),
            title: "Fix it".to_string(),
            description: String::new(),
            creator_id: "u1".to_string(),
            assignee_id: None,
            labels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_get_one_returns_not_found_for_missing_session() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        let result = get_one(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_returns_created_session() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        state.sessions.create_session(&sample_issue(), None).await.unwrap();

        let Json(response) = list(State(state)).await.unwrap();
        assert_eq!(response.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_not_found() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        let result = cancel(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_existing_session() {
        let temp = TempDir::new().unwrap();
        let state = build_state(&temp);
        let session = state.sessions.create_session(&sample_issue(), None).await.unwrap();

        let result = cancel(State(state.clone()), Path(session.id.clone())).await;
        assert!(result.is_ok());

        let loaded = state.sessions.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, crate::session::SessionStatus::Cancelled);
    }
}
