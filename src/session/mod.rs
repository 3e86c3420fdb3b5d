//! Session data model and lifecycle management.

pub mod events;
pub mod manager;
pub mod store;

pub use events::SessionEvent;
pub use manager::SessionManager;
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of a session. Terminal variants are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Created | SessionStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

/// Which kind of event triggered the session's originating createSession call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEventType {
    Issue,
    Comment,
}

/// Closed set of session metadata; anything not anticipated lands in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
pub struct SessionMetadata {
    pub creator_id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub trigger_comment_id: Option<String>,
    pub issue_title: String,
    pub trigger_event_type: TriggerEventType,
    #[serde(default)]
    pub extra: std::collections::HashMap<String, String>,
}

/// Resource limits and isolation hints passed through to the executor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
pub struct SecurityContext {
    pub allowed_paths: Vec<String>,
    pub max_memory_mb: u64,
    pub max_execution_time_ms: u64,
    pub isolated_environment: bool,
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self {
            allowed_paths: Vec::new(),
            max_memory_mb: 4096,
            max_execution_time_ms: 30 * 60 * 1000,
            isolated_environment: true,
        }
    }
}

/// The central entity: one unit of work for one issue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
pub struct Session {
    pub id: String,
    pub issue_id: String,
    pub issue_identifier: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub branch_name: Option<String>,
    pub working_dir: String,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub metadata: SessionMetadata,
    pub security_context: SecurityContext,
}

impl Session {
    /// True if status ∈ {Created, Running}.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_active() {
        assert!(SessionStatus::Created.is_active());
        assert!(SessionStatus::Running.is_active());
        assert!(!SessionStatus::Completed.is_active());
        assert!(!SessionStatus::Failed.is_active());
        assert!(!SessionStatus::Cancelled.is_active());
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::Created.is_terminal());
    }

    #[test]
    fn test_security_context_defaults() {
        let ctx = SecurityContext::default();
        assert!(ctx.isolated_environment);
        assert!(ctx.max_memory_mb > 0);
    }
}
