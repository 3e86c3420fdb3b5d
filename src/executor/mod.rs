//! The executor contract: whatever actually does the coding work.
//!
//! Real implementations (an external agent harness, a remote sandbox) are
//! out of scope here; `NullExecutor` and `ShellExecutor` are reference
//! implementations used for local smoke-testing and as test doubles.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::session::{Session, SecurityContext};
use crate::types::{Comment, Issue};

/// A single commit produced by a session's work.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub files: Vec<String>,
}

/// Outcome of an `execute` call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub files_modified: Vec<String>,
    #[serde(default)]
    pub commits: Vec<CommitInfo>,
    pub duration_ms: u64,
    pub exit_code: i32,
}

/// Everything an executor needs to do its work.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub session: Session,
    pub issue: Issue,
    pub trigger_comment: Option<Comment>,
    pub working_dir: String,
    pub branch_name: Option<String>,
    pub security_context: SecurityContext,
}

/// Anything that can run a session's work and be asked to stop.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, ctx: ExecutionContext) -> ExecutionResult;

    /// Request termination of an in-flight session. Idempotent; the
    /// corresponding `execute` call must return promptly afterward.
    async fn cancel_session(&self, session_id: &str);
}

/// Always succeeds instantly. Useful for exercising the session state
/// machine without a real coding backend.
pub struct NullExecutor;

#[async_trait]
impl Executor for NullExecutor {
    async fn execute(&self, _ctx: ExecutionContext) -> ExecutionResult {
        ExecutionResult {
            success: true,
            output: Some("null executor: no-op".to_string()),
            error: None,
            files_modified: Vec::new(),
            commits: Vec::new(),
            duration_ms: 0,
            exit_code: 0,
        }
    }

    async fn cancel_session(&self, _session_id: &str) {}
}

/// Runs a configured shell command inside the session's worktree.
pub struct ShellExecutor {
    command: String,
}

impl ShellExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, ctx: ExecutionContext) -> ExecutionResult {
        let started = std::time::Instant::now();

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&ctx.working_dir)
            .output()
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;

        match output {
            Ok(out) => ExecutionResult {
                success: out.status.success(),
                output: Some(String::from_utf8_lossy(&out.stdout).to_string()),
                error: if out.status.success() {
                    None
                } else {
                    Some(String::from_utf8_lossy(&out.stderr).to_string())
                },
                files_modified: Vec::new(),
                commits: Vec::new(),
                duration_ms,
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => ExecutionResult {
                success: false,
                output: None,
                error: Some(e.to_string()),
                files_modified: Vec::new(),
                commits: Vec::new(),
                duration_ms,
                exit_code: -1,
            },
        }
    }

    async fn cancel_session(&self, _session_id: &str) {}
}
