//! Event router: turns a classified webhook event into a session lifecycle
//! call. Thin by design — all decisions already happened in classification.

use std::sync::Arc;

use crate::session::SessionManager;
use crate::webhook::ProcessedEvent;

/// Routes a processed webhook event to the session manager, if it should
/// trigger work. No-op for non-triggering events.
pub async fn route(manager: &Arc<SessionManager>, event: ProcessedEvent) -> anyhow::Result<()> {
    if !event.should_trigger {
        tracing::debug!(reason = %event.trigger_reason, "event did not trigger a session");
        return Ok(());
    }

    let Some(issue) = event.issue else {
        tracing::warn!("triggering event carried no issue payload; dropping");
        return Ok(());
    };

    let session = manager.create_session(&issue, event.comment.as_ref()).await?;
    manager.start_session(&session.id, &issue, event.comment.as_ref()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BossAgentConfig, Config};
    use crate::executor::{Executor, NullExecutor};
    use crate::git::WorktreeManager;
    use crate::session::store::{InMemorySessionStore, SessionStore};
    use crate::types::{Actor, Issue};
    use crate::webhook::{WebhookAction, WebhookEntityType};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_config(project_root: PathBuf) -> Config {
        Config {
            api_token: "t".to_string(),
            tenant_id: "tenant".to_string(),
            project_root,
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
        }
    }

    fn build_manager(temp: &TempDir) -> Arc<SessionManager> {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let worktree_manager = Arc::new(WorktreeManager::new(temp.path().join("worktrees")));
        let executor: Arc<dyn Executor> = Arc::new(NullExecutor);
        let config = Arc::new(sample_config(temp.path().to_path_buf()));
        SessionManager::new(store, worktree_manager, executor, None, config, temp.path().to_path_buf())
    }

    fn processed_trigger_event() -> ProcessedEvent {
        ProcessedEvent {
            entity_type: WebhookEntityType::Issue,
            action: WebhookAction::Update,
            issue: Some(Issue {
                id: "i1".to_string(),
                identifier: "ENG-1".to_string(),
                title: "Fix bug".to_string(),
                description: String::new(),
                creator_id: "u1".to_string(),
                assignee_id: None,
                labels: Vec::new(),
            }),
            comment: None,
            actor: Actor { id: "u1".to_string(), name: None },
            should_trigger: true,
            trigger_reason: "issue assigned to agent".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_route_creates_and_starts_session_on_trigger() {
        let temp = TempDir::new().unwrap();
        let manager = build_manager(&temp);

        route(&manager, processed_trigger_event()).await.unwrap();

        let sessions = manager.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_route_ignores_non_trigger_event() {
        let temp = TempDir::new().unwrap();
        let manager = build_manager(&temp);

        let mut event = processed_trigger_event();
        event.should_trigger = false;
        event.trigger_reason = "wrong tenant".to_string();

        route(&manager, event).await.unwrap();

        let sessions = manager.list_sessions().await.unwrap();
        assert!(sessions.is_empty());
    }
}
