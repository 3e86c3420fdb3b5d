//! Session Manager: the core state machine tying together the store, the
//! git worktree manager, the boss agent delegation path, and the executor.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::boss_agent::BossAgent;
use crate::config::Config;
use crate::executor::{Executor, ExecutionContext};
use crate::git::{create_descriptive_branch_name, WorktreeManager};
use crate::session::events::{SessionEvent, SessionEventBus};
use crate::session::store::SessionStore;
use crate::session::{SecurityContext, Session, SessionMetadata, SessionStatus, TriggerEventType};
use crate::types::{Comment, Issue};

/// Per-status counts, the shape `GET /stats` returns.
#[derive(Debug, Clone, Default, serde::Serialize, schemars::JsonSchema, utoipa::ToSchema)]
pub struct SessionStats {
    pub created: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    worktree_manager: Arc<WorktreeManager>,
    executor: Arc<dyn Executor>,
    boss_agent: Option<Arc<dyn BossAgent>>,
    events: SessionEventBus,
    config: Arc<Config>,
    repo_path: PathBuf,
    timeouts: Mutex<HashMap<String, JoinHandle<()>>>,
    issue_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        worktree_manager: Arc<WorktreeManager>,
        executor: Arc<dyn Executor>,
        boss_agent: Option<Arc<dyn BossAgent>>,
        config: Arc<Config>,
        repo_path: PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            worktree_manager,
            executor,
            boss_agent,
            events: SessionEventBus::default(),
            config,
            repo_path,
            timeouts: Mutex::new(HashMap::new()),
            issue_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn issue_lock(&self, issue_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.issue_locks.lock().await;
        locks.entry(issue_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Create (or reuse, if one is active) a session for an issue.
    pub async fn create_session(&self, issue: &Issue, trigger_comment: Option<&Comment>) -> anyhow::Result<Session> {
        let lock = self.issue_lock(&issue.id).await;
        let _guard = lock.lock().await;

        if let Some(existing) = self.store.load_by_issue(&issue.id).await? {
            if existing.is_active() {
                return Ok(existing);
            }
        }

        let creator_id = trigger_comment
            .map(|c| c.author_id.clone())
            .unwrap_or_else(|| {
                if issue.creator_id.is_empty() {
                    "unknown".to_string()
                } else {
                    issue.creator_id.clone()
                }
            });

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let branch_name = if self.config.create_branches {
            Some(create_descriptive_branch_name(&issue.identifier, &issue.title))
        } else {
            None
        };

        let session = Session {
            working_dir: self.worktree_manager.worktree_path(&id).display().to_string(),
            id,
            issue_id: issue.id.clone(),
            issue_identifier: issue.identifier.clone(),
            status: SessionStatus::Created,
            branch_name,
            started_at: now,
            last_activity_at: now,
            completed_at: None,
            process_id: None,
            error: None,
            metadata: SessionMetadata {
                creator_id,
                tenant_id: self.config.tenant_id.clone(),
                trigger_comment_id: trigger_comment.map(|c| c.id.clone()),
                issue_title: issue.title.clone(),
                trigger_event_type: if trigger_comment.is_some() {
                    TriggerEventType::Comment
                } else {
                    TriggerEventType::Issue
                },
                extra: HashMap::new(),
            },
            security_context: SecurityContext::default(),
        };

        self.persist_with_retry(&session).await?;
        self.events.publish(SessionEvent::Created(session.clone()));

        Ok(session)
    }

    /// Start (or idempotently no-op on) a session's execution.
    pub async fn start_session(
        self: &Arc<Self>,
        session_id: &str,
        issue: &Issue,
        trigger_comment: Option<&Comment>,
    ) -> anyhow::Result<()> {
        let mut session = self
            .store
            .load(session_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("session '{session_id}' not found"))?;

        if session.status == SessionStatus::Running {
            tracing::warn!(session_id, "start_session called on an already-running session, ignoring");
            return Ok(());
        }

        session.status = SessionStatus::Running;
        session.last_activity_at = Utc::now();
        self.persist_with_retry(&session).await?;
        self.events.publish(SessionEvent::Started(session.clone()));

        self.arm_timeout(session_id.to_string()).await;

        if let Some(boss_agent) = self.boss_agent.clone().filter(|_| self.config.boss_agent.enabled) {
            match boss_agent.handle_task(issue, trigger_comment).await {
                Ok(Some(result)) => {
                    let status = if result.success { SessionStatus::Completed } else { SessionStatus::Failed };
                    let updated = self.update_status_with_retry(session_id, status).await?;
                    self.clear_timeout(session_id).await;

                    let execution_result = crate::executor::ExecutionResult {
                        success: result.success,
                        output: Some(result.summary.clone()),
                        error: if result.success { None } else { Some(result.summary.clone()) },
                        files_modified: result.files_modified.clone(),
                        commits: result.commits.clone(),
                        duration_ms: result.duration_ms,
                        exit_code: if result.success { 0 } else { 1 },
                    };

                    if result.success {
                        self.events.publish(SessionEvent::Completed(updated, execution_result));
                    } else {
                        self.events.publish(SessionEvent::Failed(updated, result.summary));
                    }
                    return Ok(());
                }
                Ok(None) => {
                    tracing::debug!(session_id, "boss agent declined, falling through to direct executor");
                }
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "boss agent errored, falling through to direct executor");
                }
            }
        }

        self.run_direct_executor(session, issue.clone(), trigger_comment.cloned()).await
    }

    async fn run_direct_executor(self: &Arc<Self>, mut session: Session, issue: Issue, trigger_comment: Option<Comment>) -> anyhow::Result<()> {
        if let Some(branch_name) = session.branch_name.clone() {
            match self
                .worktree_manager
                .create_worktree(&self.repo_path, &session.id, &self.config.default_branch, Some(&branch_name))
                .await
            {
                Ok(worktree) => {
                    session.working_dir = worktree.path.display().to_string();
                    self.persist_with_retry(&session).await?;
                }
                Err(e) => {
                    session.error = Some(e.to_string());
                    let updated = self.update_status_with_retry(&session.id, SessionStatus::Failed).await?;
                    self.clear_timeout(&session.id).await;
                    self.events.publish(SessionEvent::Failed(updated, e.to_string()));
                    return Ok(());
                }
            }
        }

        let ctx = ExecutionContext {
            session: session.clone(),
            issue,
            trigger_comment,
            working_dir: session.working_dir.clone(),
            branch_name: session.branch_name.clone(),
            security_context: session.security_context.clone(),
        };

        let this = Arc::clone(self);
        let session_id = session.id.clone();
        tokio::spawn(async move {
            let result = this.executor.execute(ctx).await;

            let outcome = if result.success {
                this.update_status_with_retry(&session_id, SessionStatus::Completed).await
            } else {
                this.update_status_with_retry(&session_id, SessionStatus::Failed).await
            };

            this.clear_timeout(&session_id).await;

            match outcome {
                Ok(updated) => {
                    if result.success {
                        this.events.publish(SessionEvent::Completed(updated, result));
                    } else {
                        let message = result.error.clone().unwrap_or_else(|| "execution failed".to_string());
                        this.events.publish(SessionEvent::Failed(updated, message));
                    }
                }
                Err(e) => tracing::error!(session_id, error = %e, "failed to persist terminal session status"),
            }
        });

        Ok(())
    }

    /// Cancel a session. Idempotent on already-terminal sessions.
    pub async fn cancel_session(&self, session_id: &str) -> anyhow::Result<()> {
        let session = self
            .store
            .load(session_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("session '{session_id}' not found"))?;

        self.executor.cancel_session(session_id).await;
        self.clear_timeout(session_id).await;

        if session.status == SessionStatus::Cancelled {
            return Ok(());
        }
        if session.status.is_terminal() {
            return Ok(());
        }

        let updated = self.update_status_with_retry(session_id, SessionStatus::Cancelled).await?;
        self.events.publish(SessionEvent::Cancelled(updated));
        Ok(())
    }

    pub async fn get_session(&self, id: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.store.load(id).await?)
    }

    pub async fn get_session_by_issue(&self, issue_id: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.store.load_by_issue(issue_id).await?)
    }

    pub async fn list_sessions(&self) -> anyhow::Result<Vec<Session>> {
        Ok(self.store.list().await?)
    }

    pub async fn list_active_sessions(&self) -> anyhow::Result<Vec<Session>> {
        Ok(self.store.list_active().await?)
    }

    pub async fn cleanup_old_sessions(&self, max_age_days: i64) -> anyhow::Result<usize> {
        Ok(self.store.cleanup_old_sessions(max_age_days).await?)
    }

    pub async fn get_stats(&self) -> anyhow::Result<SessionStats> {
        let sessions = self.store.list().await?;
        let mut stats = SessionStats::default();
        for session in &sessions {
            match session.status {
                SessionStatus::Created => stats.created += 1,
                SessionStatus::Running => stats.running += 1,
                SessionStatus::Completed => stats.completed += 1,
                SessionStatus::Failed => stats.failed += 1,
                SessionStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }

    async fn persist_with_retry(&self, session: &Session) -> anyhow::Result<()> {
        let save = || async { self.store.save(session).await };
        save.retry(ExponentialBuilder::default().with_max_times(1)).await?;
        Ok(())
    }

    async fn update_status_with_retry(&self, session_id: &str, status: SessionStatus) -> anyhow::Result<Session> {
        let update = || async { self.store.update_status(session_id, status).await };
        let session = update.retry(ExponentialBuilder::default().with_max_times(1)).await?;
        Ok(session)
    }

    async fn arm_timeout(self: &Arc<Self>, session_id: String) {
        self.clear_timeout(&session_id).await;

        let this = Arc::clone(self);
        let duration = std::time::Duration::from_secs(self.config.session_timeout_minutes * 60);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Ok(Some(session)) = this.store.load(&session_id).await {
                if session.status.is_active() {
                    if let Err(e) = this.cancel_session(&session_id).await {
                        tracing::warn!(session_id = %session_id, error = %e, "timeout cancellation failed");
                    }
                }
            }
        });

        self.timeouts.lock().await.insert(session_id, handle);
    }

    async fn clear_timeout(&self, session_id: &str) {
        if let Some(handle) = self.timeouts.lock().await.remove(session_id) {
            handle.abort();
        }
    }
}
