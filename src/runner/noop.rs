//! No-op runner for tests and environments with no configured task runner.

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::runner::{Runner, TaskContext, TaskHandle};

pub struct NoopRunner;

#[async_trait]
impl Runner for NoopRunner {
    async fn create_task(&self, _prompt: &str, _context: &TaskContext) -> Result<TaskHandle, ApiError> {
        Err(ApiError::NotConfigured { provider: "runner" })
    }

    async fn cancel_task(&self, _task_id: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_task_reports_not_configured() {
        let runner = NoopRunner;
        let context = TaskContext {
            issue_identifier: "ENG-1".to_string(),
            repository: "org/repo".to_string(),
        };
        let result = runner.create_task("prompt", &context).await;
        assert!(matches!(result, Err(ApiError::NotConfigured { .. })));
    }
}
