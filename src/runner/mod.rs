//! Outbound wrapper around the external task runner that the boss agent
//! delegates work to.

mod http;
mod noop;

pub use http::HttpRunner;
pub use noop::NoopRunner;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Returned by `create_task`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskHandle {
    pub task_id: String,
    #[serde(default)]
    pub estimated_duration_secs: Option<u64>,
}

/// A progress or terminal event for a delegated task, whether observed via
/// the progress-callback webhook or a poll.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    #[serde(rename = "task.started")]
    Started,
    #[serde(rename = "task.progress")]
    Progress { progress: u8 },
    #[serde(rename = "task.completed")]
    Completed {
        summary: String,
        #[serde(default)]
        files_modified: Vec<String>,
        #[serde(default)]
        commits: Vec<crate::executor::CommitInfo>,
    },
    #[serde(rename = "task.failed")]
    Failed { error: String },
    #[serde(rename = "task.cancelled")]
    Cancelled,
}

impl RunnerEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerEvent::Completed { .. } | RunnerEvent::Failed { .. } | RunnerEvent::Cancelled)
    }
}

/// Request context handed to the external runner along with the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    pub issue_identifier: String,
    pub repository: String,
}

#[async_trait]
pub trait Runner: Send + Sync {
    async fn create_task(&self, prompt: &str, context: &TaskContext) -> Result<TaskHandle, ApiError>;
    async fn cancel_task(&self, task_id: &str) -> Result<(), ApiError>;

    /// Best-effort status poll, used as a fallback when no progress webhook
    /// arrives within the configured window. `None` means "no new status".
    async fn poll_status(&self, _task_id: &str) -> Option<RunnerEvent> {
        None
    }
}
