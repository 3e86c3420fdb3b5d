//! Shared state for the REST API.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::boss_agent::RunnerBossAgent;
use crate::config::Config;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionManager>,
    pub config: Arc<Config>,
    pub boss_agent: Option<Arc<RunnerBossAgent>>,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(sessions: Arc<SessionManager>, config: Arc<Config>, boss_agent: Option<Arc<RunnerBossAgent>>) -> Self {
        Self {
            sessions,
            config,
            boss_agent,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
