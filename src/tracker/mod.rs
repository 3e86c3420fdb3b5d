//! Outbound wrapper around the issue tracker (Linear). Failures here are
//! logged and never fail a session.

mod linear;
mod noop;

pub use linear::LinearTracker;
pub use noop::NoopTracker;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::types::Issue;

#[async_trait]
pub trait Tracker: Send + Sync {
    async fn get_current_user(&self) -> Result<String, ApiError>;
    async fn create_comment(&self, issue_id: &str, body: &str) -> Result<String, ApiError>;
    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<(), ApiError>;
    async fn get_issue(&self, issue_id: &str) -> Result<Issue, ApiError>;
}
