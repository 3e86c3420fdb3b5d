//! No-op tracker for tests and standalone/offline operation.

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::tracker::Tracker;
use crate::types::Issue;

pub struct NoopTracker;

#[async_trait]
impl Tracker for NoopTracker {
    async fn get_current_user(&self) -> Result<String, ApiError> {
        Ok("noop-agent".to_string())
    }

    async fn create_comment(&self, _issue_id: &str, _body: &str) -> Result<String, ApiError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn update_comment(&self, _comment_id: &str, _body: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn get_issue(&self, issue_id: &str) -> Result<Issue, ApiError> {
        Ok(Issue {
            id: issue_id.to_string(),
            identifier: issue_id.to_string(),
            title: String::new(),
            description: String::new(),
            creator_id: "unknown".to_string(),
            assignee_id: None,
            labels: Vec::new(),
        })
    }
}
