//! Boss Agent: classifies a task and, when warranted, delegates it to an
//! external task runner instead of running it in-process.

mod classify;
mod delegate;

pub use classify::{classify, Classification, Priority, Strategy, TaskType};
pub use delegate::RunnerBossAgent;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;

pub use crate::errors::DelegationError;
use crate::types::{Comment, Issue};

/// Result of a fully-delegated task, synthesized into an `ExecutionResult`
/// shape by the Session Manager.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DelegationResult {
    pub success: bool,
    pub summary: String,
    pub files_modified: Vec<String>,
    pub commits: Vec<crate::executor::CommitInfo>,
    pub duration_ms: u64,
}

/// A decision of whether and how to delegate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub delegate: bool,
    pub strategy: Strategy,
}

/// Score a classification against configured delegation policy.
pub fn decide(classification: &Classification, threshold: u8, whitelist: &[String]) -> Decision {
    let type_allowed = whitelist.iter().any(|t| t == classification.task_type.as_str());
    let delegate = classification.complexity >= threshold && type_allowed;

    Decision {
        delegate,
        strategy: Strategy::Codegen,
    }
}

/// Handles a triggering event end-to-end: classify, decide, and (if
/// warranted) delegate/monitor/report. Returns `Ok(None)` when the Session
/// Manager should fall through to the direct executor.
#[async_trait]
pub trait BossAgent: Send + Sync {
    async fn handle_task(
        &self,
        issue: &Issue,
        trigger_comment: Option<&Comment>,
    ) -> Result<Option<DelegationResult>, DelegationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_classification(complexity: u8, task_type: TaskType) -> Classification {
        Classification {
            task_type,
            complexity,
            priority: Priority::Normal,
        }
    }

    #[test]
    fn test_decide_requires_threshold_and_whitelist() {
        let whitelist = vec!["feature".to_string(), "refactor".to_string()];
        let classification = sample_classification(7, TaskType::Feature);
        let decision = decide(&classification, 6, &whitelist);
        assert!(decision.delegate);
    }

    #[test]
    fn test_decide_rejects_below_threshold() {
        let whitelist = vec!["feature".to_string()];
        let classification = sample_classification(3, TaskType::Feature);
        let decision = decide(&classification, 6, &whitelist);
        assert!(!decision.delegate);
    }

    #[test]
    fn test_decide_rejects_type_not_in_whitelist() {
        let whitelist = vec!["feature".to_string()];
        let classification = sample_classification(9, TaskType::BugFix);
        let decision = decide(&classification, 6, &whitelist);
        assert!(!decision.delegate);
    }
}
