//! Response DTOs for the REST API, schema'd for OpenAPI generation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::session::Session;

#[derive(Debug, Serialize, ToSchema, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: i64,
    #[serde(rename = "oauthEnabled")]
    pub oauth_enabled: bool,
}

/// Sanitized configuration view; never includes tokens or secrets.
#[derive(Debug, Serialize, ToSchema, JsonSchema)]
pub struct ConfigResponse {
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    pub port: u16,
    #[serde(rename = "sessionTimeoutMinutes")]
    pub session_timeout_minutes: u64,
    #[serde(rename = "defaultBranch")]
    pub default_branch: String,
    #[serde(rename = "createBranches")]
    pub create_branches: bool,
    #[serde(rename = "maxConcurrentSessions")]
    pub max_concurrent_sessions: usize,
    #[serde(rename = "bossAgentEnabled")]
    pub boss_agent_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema, JsonSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize, ToSchema, JsonSchema)]
pub struct WebhookAcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Deserialize, ToSchema, JsonSchema)]
pub struct ProgressCallbackPath {
    pub task_id: String,
}
