//! Delegation: submits classified work to the external task runner, then
//! monitors it to completion via progress-callback webhook or poll.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};

use crate::boss_agent::{classify, decide, BossAgent, DelegationError, DelegationResult};
use crate::config::BossAgentConfig;
use crate::runner::{Runner, RunnerEvent, TaskContext};
use crate::tracker::Tracker;
use crate::types::{Comment, Issue};

struct PendingTask {
    issue_id: String,
    completion: Option<oneshot::Sender<RunnerEvent>>,
}

/// Bidirectional taskId <-> issueId index, guarded by a mutex.
#[derive(Default)]
struct TaskIndex {
    by_task: HashMap<String, PendingTask>,
    task_by_issue: HashMap<String, String>,
}

impl TaskIndex {
    fn task_for_issue(&self, issue_id: &str) -> Option<&str> {
        self.task_by_issue.get(issue_id).map(String::as_str)
    }
}

/// Delegates classified tasks to an external runner and reports outcomes
/// back to the tracker as issue comments.
pub struct RunnerBossAgent {
    runner: Arc<dyn Runner>,
    tracker: Arc<dyn Tracker>,
    config: BossAgentConfig,
    repository: String,
    session_timeout_secs: u64,
    index: Mutex<TaskIndex>,
}

impl RunnerBossAgent {
    pub fn new(runner: Arc<dyn Runner>, tracker: Arc<dyn Tracker>, config: BossAgentConfig, repository: String, session_timeout_secs: u64) -> Self {
        Self {
            runner,
            tracker,
            config,
            repository,
            session_timeout_secs,
            index: Mutex::new(TaskIndex::default()),
        }
    }

    /// Called by the progress-callback HTTP route when a runner event
    /// arrives for `task_id`. No-op if the task is unknown or already
    /// resolved.
    pub async fn handle_progress_event(&self, task_id: &str, event: RunnerEvent) {
        if !event.is_terminal() {
            return;
        }

        let mut index = self.index.lock().await;
        if let Some(pending) = index.by_task.get_mut(task_id) {
            index.task_by_issue.remove(&pending.issue_id);
            if let Some(sender) = pending.completion.take() {
                let _ = sender.send(event);
            }
        }
    }

    /// Looks up the in-flight task id delegated for a given issue, if any.
    pub async fn task_for_issue(&self, issue_id: &str) -> Option<String> {
        let index = self.index.lock().await;
        index.task_for_issue(issue_id).map(str::to_string)
    }

    fn build_prompt(issue: &Issue, comment: Option<&Comment>) -> String {
        let mut prompt = format!("Issue {}: {}\n\n{}", issue.identifier, issue.title, issue.description);
        if let Some(comment) = comment {
            prompt.push_str(&format!("\n\nTriggering comment: {}", comment.body));
        }
        prompt
    }

    async fn report(&self, issue_id: &str, event: &RunnerEvent) {
        let body = match event {
            RunnerEvent::Completed { summary, .. } => format!("Delegated task completed: {summary}"),
            RunnerEvent::Failed { error } => format!("Delegated task failed: {error}"),
            RunnerEvent::Cancelled => "Delegated task was cancelled.".to_string(),
            _ => return,
        };

        if let Err(e) = self.tracker.create_comment(issue_id, &body).await {
            tracing::warn!(issue_id, error = %e, "failed to post delegation result comment");
        }
    }
}

#[async_trait]
impl BossAgent for RunnerBossAgent {
    async fn handle_task(&self, issue: &Issue, trigger_comment: Option<&Comment>) -> Result<Option<DelegationResult>, DelegationError> {
        let classification = classify(issue, trigger_comment);
        let whitelist = self.config.delegatable_task_types.clone();
        let decision = decide(&classification, self.config.complexity_threshold, &whitelist);

        if !decision.delegate {
            return Ok(None);
        }

        let prompt = Self::build_prompt(issue, trigger_comment);
        let context = TaskContext {
            issue_identifier: issue.identifier.clone(),
            repository: self.repository.clone(),
        };

        let handle = self
            .runner
            .create_task(&prompt, &context)
            .await
            .map_err(|e| DelegationError::Runner(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        {
            let mut index = self.index.lock().await;
            index.by_task.insert(
                handle.task_id.clone(),
                PendingTask {
                    issue_id: issue.id.clone(),
                    completion: Some(tx),
                },
            );
            index.task_by_issue.insert(issue.id.clone(), handle.task_id.clone());
        }

        // Runner-side fallback window: poll only kicks in once this elapses
        // with no progress webhook. Defaults to twice the runner's own
        // duration estimate when it provides one.
        let progress_window = match handle.estimated_duration_secs {
            Some(estimated) => Duration::from_secs(estimated.saturating_mul(2)),
            None => Duration::from_secs(self.config.progress_window_secs),
        };
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let session_timeout = Duration::from_secs(self.session_timeout_secs);
        let hard_timeout = progress_window.max(session_timeout);
        let deadline = tokio::time::Instant::now() + hard_timeout;

        let terminal_event = match tokio::time::timeout(progress_window, rx).await {
            Ok(received) => received.map_err(|_| DelegationError::Timeout)?,
            Err(_elapsed) => match self.poll_until_terminal(&handle.task_id, poll_interval, deadline).await {
                Some(event) => event,
                None => {
                    let mut index = self.index.lock().await;
                    index.by_task.remove(&handle.task_id);
                    index.task_by_issue.remove(&issue.id);
                    return Err(DelegationError::Timeout);
                }
            },
        };

        {
            let mut index = self.index.lock().await;
            index.by_task.remove(&handle.task_id);
            index.task_by_issue.remove(&issue.id);
        }

        self.report(&issue.id, &terminal_event).await;

        Ok(Some(match terminal_event {
            RunnerEvent::Completed { summary, files_modified, commits } => DelegationResult {
                success: true,
                summary,
                files_modified,
                commits,
                duration_ms: 0,
            },
            RunnerEvent::Failed { error } => DelegationResult {
                success: false,
                summary: error,
                files_modified: Vec::new(),
                commits: Vec::new(),
                duration_ms: 0,
            },
            RunnerEvent::Cancelled => DelegationResult {
                success: false,
                summary: "cancelled".to_string(),
                files_modified: Vec::new(),
                commits: Vec::new(),
                duration_ms: 0,
            },
            RunnerEvent::Started | RunnerEvent::Progress { .. } => unreachable!("non-terminal event reached terminal branch"),
        }))
    }
}

impl RunnerBossAgent {
    async fn poll_until_terminal(&self, task_id: &str, interval: Duration, deadline: tokio::time::Instant) -> Option<RunnerEvent> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            if let Some(event) = self.runner.poll_status(task_id).await {
                if event.is_terminal() {
                    return Some(event);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::runner::TaskHandle;
    use crate::tracker::NoopTracker;

    struct InstantCompleteRunner;

    #[async_trait]
    impl Runner for InstantCompleteRunner {
        async fn create_task(&self, _prompt: &str, _context: &TaskContext) -> Result<TaskHandle, ApiError> {
            Ok(TaskHandle { task_id: "task-1".to_string(), estimated_duration_secs: Some(1) })
        }

        async fn cancel_task(&self, _task_id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Never calls back via webhook; only resolves through `poll_status`,
    /// exercising the fallback path once the progress window elapses.
    struct PollOnlyRunner;

    #[async_trait]
    impl Runner for PollOnlyRunner {
        async fn create_task(&self, _prompt: &str, _context: &TaskContext) -> Result<TaskHandle, ApiError> {
            Ok(TaskHandle { task_id: "task-2".to_string(), estimated_duration_secs: None })
        }

        async fn cancel_task(&self, _task_id: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn poll_status(&self, _task_id: &str) -> Option<RunnerEvent> {
            Some(RunnerEvent::Completed { summary: "via poll".to_string(), files_modified: vec![], commits: vec![] })
        }
    }

    fn sample_issue(complexity_title: &str) -> Issue {
        Issue {
            id: "i1".to_string(),
            identifier: "ENG-1".to_string(),
            title: complexity_title.to_string(),
            description: "touches auth and migration and concurrency and perf".to_string(),
            creator_id: "u1".to_string(),
            assignee_id: None,
            labels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_handle_task_returns_none_when_not_delegated() {
        let agent = RunnerBossAgent::new(
            Arc::new(InstantCompleteRunner),
            Arc::new(NoopTracker),
            BossAgentConfig { complexity_threshold: 10, ..BossAgentConfig::default() },
            "org/repo".to_string(),
            1800,
        );

        let issue = Issue {
            id: "i1".to_string(),
            identifier: "ENG-1".to_string(),
            title: "Fix typo".to_string(),
            description: String::new(),
            creator_id: "u1".to_string(),
            assignee_id: None,
            labels: Vec::new(),
        };

        let result = agent.handle_task(&issue, None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_handle_progress_event_resolves_pending_task() {
        let agent = Arc::new(RunnerBossAgent::new(
            Arc::new(InstantCompleteRunner),
            Arc::new(NoopTracker),
            BossAgentConfig {
                complexity_threshold: 1,
                delegatable_task_types: vec!["feature".to_string()],
                progress_window_secs: 5,
                poll_interval_secs: 1,
                ..BossAgentConfig::default()
            },
            "org/repo".to_string(),
            1800,
        ));

        let issue = sample_issue("Implement new feature");
        let agent_clone = Arc::clone(&agent);

        let handle = tokio::spawn(async move { agent_clone.handle_task(&issue, None).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        agent
            .handle_progress_event(
                "task-1",
                RunnerEvent::Completed { summary: "done".to_string(), files_modified: vec![], commits: vec![] },
            )
            .await;

        let result = handle.await.unwrap().unwrap().unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_handle_task_falls_back_to_poll_after_progress_window() {
        let agent = RunnerBossAgent::new(
            Arc::new(PollOnlyRunner),
            Arc::new(NoopTracker),
            BossAgentConfig {
                complexity_threshold: 1,
                delegatable_task_types: vec!["feature".to_string()],
                progress_window_secs: 0,
                poll_interval_secs: 1,
                ..BossAgentConfig::default()
            },
            "org/repo".to_string(),
            1800,
        );

        let issue = sample_issue("Implement new feature");
        let result = agent.handle_task(&issue, None).await.unwrap().unwrap();
        assert!(result.success);
        assert_eq!(result.summary, "via poll");
    }
}
