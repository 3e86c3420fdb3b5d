//! Shared domain types describing the external issue tracker's entities.
//!
//! These are intentionally minimal: the system stores only what it needs
//! for context building and branch naming, not a full mirror of the
//! tracker's schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An issue (ticket) as referenced from the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub creator_id: String,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A comment posted on an issue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub author_id: String,
    pub issue_id: String,
}

/// The tracker user who triggered an event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
