//! Configuration resolution: embedded defaults, an optional TOML file, and
//! environment variables, layered through the `config` crate.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Resolved runtime configuration. Constructed once in `main` and passed
/// explicitly into every component — no global state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Linear (or compatible tracker) API token. Required, never logged.
    pub api_token: String,

    /// The single tenant (organization/workspace id) this process serves.
    pub tenant_id: String,

    /// Root directory containing the git repository work sessions operate on.
    pub project_root: PathBuf,

    /// Tracker user id the agent runs as. Auto-discovered via the tracker
    /// wrapper's `getCurrentUser()` if left unset at load time.
    #[serde(default)]
    pub agent_user_id: Option<String>,

    /// HTTP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-session timeout, in minutes, before an implicit cancel fires.
    #[serde(default = "default_timeout_minutes")]
    pub session_timeout_minutes: u64,

    /// Branch to base new worktrees off of.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Whether `createSession` should compute and assign a branch name.
    #[serde(default = "default_true")]
    pub create_branches: bool,

    /// HMAC secret for inbound webhook signatures. `None` disables
    /// verification (a warning is logged on first use).
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Upper bound on concurrently active sessions.
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,

    /// Directory for session records, logs, and worktrees.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// How long a terminal session is retained before `cleanupOldSessions`
    /// purges it, in days.
    #[serde(default = "default_cleanup_max_age_days")]
    pub cleanup_max_age_days: i64,

    #[serde(default)]
    pub boss_agent: BossAgentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Explicit CORS allow-list for the admin HTTP API. Empty = no
    /// cross-origin access (never "*").
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BossAgentConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Minimum complexity score (1-10) that makes a task eligible for
    /// delegation.
    #[serde(default = "default_boss_agent_threshold")]
    pub complexity_threshold: u8,

    /// Task types eligible for delegation.
    #[serde(default = "default_delegatable_task_types")]
    pub delegatable_task_types: Vec<String>,

    /// Poll interval, in seconds, used as a fallback when no progress
    /// webhook arrives.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long to wait for a progress webhook before falling back to
    /// polling, in seconds.
    #[serde(default = "default_progress_window_secs")]
    pub progress_window_secs: u64,

    /// HMAC secret for the progress-callback webhook. Separate from the
    /// main tracker webhook secret.
    #[serde(default)]
    pub runner_webhook_secret: Option<String>,

    /// Base URL of the external task runner. `None` falls back to a no-op
    /// runner that rejects every delegation.
    #[serde(default)]
    pub runner_url: Option<String>,

    /// Bearer token presented to the external task runner, if required.
    #[serde(default)]
    pub runner_token: Option<String>,
}

impl Default for BossAgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            complexity_threshold: default_boss_agent_threshold(),
            delegatable_task_types: default_delegatable_task_types(),
            poll_interval_secs: default_poll_interval_secs(),
            progress_window_secs: default_progress_window_secs(),
            runner_webhook_secret: None,
            runner_url: None,
            runner_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

fn default_port() -> u16 {
    3005
}
fn default_timeout_minutes() -> u64 {
    30
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_concurrent_sessions() -> usize {
    16
}
fn default_state_dir() -> PathBuf {
    PathBuf::from(".bridge")
}
fn default_cleanup_max_age_days() -> i64 {
    7
}
fn default_boss_agent_threshold() -> u8 {
    6
}
fn default_delegatable_task_types() -> Vec<String> {
    vec!["feature".to_string(), "refactor".to_string(), "perf".to_string()]
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_progress_window_secs() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from (in increasing priority) embedded defaults,
    /// an optional TOML file, and `BRIDGE_`-prefixed environment variables.
    ///
    /// `BRIDGE_API_TOKEN`, `BRIDGE_TENANT_ID`, and `BRIDGE_PROJECT_ROOT`
    /// are required; the rest carry usable defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        } else {
            builder = builder.add_source(config::File::with_name(".bridge/config.toml").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("BRIDGE")
                .separator("__")
                .try_parsing(true),
        );

        let raw = builder.build()?;
        let mut config: Config = raw.try_deserialize()?;

        // Well-known Linear-style env var names take precedence when the
        // BRIDGE_-prefixed equivalents are unset; matches the real-world
        // deployment environment documented in env_vars.rs.
        config.apply_named_env_overrides();
        config.apply_preview_url_port_override();
        config.validate()?;

        Ok(config)
    }

    fn apply_named_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LINEAR_API_TOKEN") {
            if !v.is_empty() {
                self.api_token = v;
            }
        }
        if let Ok(v) = std::env::var("LINEAR_ORGANIZATION_ID") {
            if !v.is_empty() {
                self.tenant_id = v;
            }
        }
        if let Ok(v) = std::env::var("PROJECT_ROOT_DIR") {
            if !v.is_empty() {
                self.project_root = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("LINEAR_WEBHOOK_SECRET") {
            if !v.is_empty() {
                self.webhook_secret = Some(v);
            }
        }
        if let Ok(v) = std::env::var("WEBHOOK_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("SESSION_TIMEOUT_MINUTES") {
            if let Ok(mins) = v.parse() {
                self.session_timeout_minutes = mins;
            }
        }
        if let Ok(v) = std::env::var("DEFAULT_BRANCH") {
            if !v.is_empty() {
                self.default_branch = v;
            }
        }
        if let Ok(v) = std::env::var("CREATE_BRANCHES") {
            self.create_branches = parse_bool(&v, self.create_branches);
        }
        if let Ok(v) = std::env::var("CLAUDE_AGENT_USER_ID") {
            if !v.is_empty() {
                self.agent_user_id = Some(v);
            }
        }
        if let Ok(v) = std::env::var("ENABLE_BOSS_AGENT") {
            self.boss_agent.enabled = parse_bool(&v, self.boss_agent.enabled);
        }
        if let Ok(v) = std::env::var("BOSS_AGENT_THRESHOLD") {
            if let Ok(t) = v.parse() {
                self.boss_agent.complexity_threshold = t;
            }
        }
        if let Ok(v) = std::env::var("RUNNER_URL") {
            if !v.is_empty() {
                self.boss_agent.runner_url = Some(v);
            }
        }
        if let Ok(v) = std::env::var("RUNNER_TOKEN") {
            if !v.is_empty() {
                self.boss_agent.runner_token = Some(v);
            }
        }
        if let Ok(v) = std::env::var("RUNNER_WEBHOOK_SECRET") {
            if !v.is_empty() {
                self.boss_agent.runner_webhook_secret = Some(v);
            }
        }
        if let Ok(v) = std::env::var("MAX_CONCURRENT_SESSIONS") {
            if let Ok(n) = v.parse() {
                self.max_concurrent_sessions = n;
            }
        }
        if let Ok(v) = std::env::var("DEBUG") {
            if parse_bool(&v, false) {
                self.logging.level = "debug".to_string();
            }
        }
    }

    /// Preview-hosting environments (CI/ephemeral preview URLs) force the
    /// listen port to 3000 regardless of configuration, signaled by the
    /// presence of a well-known environment hint.
    fn apply_preview_url_port_override(&mut self) {
        if std::env::var("PREVIEW_URL").is_ok() || std::env::var("RENDER_EXTERNAL_URL").is_ok() {
            self.port = 3000;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired { field: "api_token" });
        }
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired { field: "tenant_id" });
        }
        if !(1..=65535).contains(&u32::from(self.port)) {
            return Err(ConfigError::InvalidPort(u32::from(self.port)));
        }
        if !self.project_root.exists() {
            return Err(ConfigError::ProjectRootMissing(
                self.project_root.display().to_string(),
            ));
        }
        if self.session_timeout_minutes == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Path to the directory holding one JSON file per session.
    pub fn sessions_path(&self) -> PathBuf {
        self.resolve(&self.state_dir).join("sessions")
    }

    /// Path to the directory holding per-session git worktrees.
    pub fn worktrees_path(&self) -> PathBuf {
        self.resolve(&self.state_dir).join("worktrees")
    }

    /// Path to the directory holding rolling log files.
    pub fn logs_path(&self) -> PathBuf {
        self.resolve(&self.state_dir).join("logs")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Write a template configuration file for `init`.
    pub fn write_template(path: &Path) -> std::io::Result<()> {
        let template = r#"# claude-linear-bridge configuration
# Required:
api_token = "lin_api_REPLACE_ME"
tenant_id = "REPLACE_ME"
project_root = "."

# Optional (defaults shown):
# port = 3005
# session_timeout_minutes = 30
# default_branch = "main"
# create_branches = true
# webhook_secret = "REPLACE_ME"
# max_concurrent_sessions = 16

[boss_agent]
enabled = false
complexity_threshold = 6

[logging]
level = "info"
"#;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, template)
    }
}

fn parse_bool(raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn base_config(project_root: PathBuf) -> Config {
        Config {
            api_token: "token".to_string(),
            tenant_id: "org-1".to_string(),
            project_root,
            agent_user_id: None,
            port: default_port(),
            session_timeout_minutes: default_timeout_minutes(),
            default_branch: default_branch(),
            create_branches: true,
            webhook_secret: None,
            max_concurrent_sessions: default_max_concurrent_sessions(),
            state_dir: default_state_dir(),
            cleanup_max_age_days: default_cleanup_max_age_days(),
            boss_agent: BossAgentConfig::default(),
            logging: LoggingConfig::default(),
            cors_origins: Vec::new(),
        }
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = base_config(temp.path().to_path_buf());
        config.api_token = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { field: "api_token" })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_project_root() {
        let mut config = base_config(PathBuf::from("/nonexistent/path/for/sure"));
        config.api_token = "x".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProjectRootMissing(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = base_config(temp.path().to_path_buf());
        config.session_timeout_minutes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_validate_accepts_well_formed_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = base_config(temp.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sessions_path_relative_to_state_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = base_config(temp.path().to_path_buf());
        config.state_dir = PathBuf::from("/abs/state");
        assert_eq!(config.sessions_path(), PathBuf::from("/abs/state/sessions"));
        assert_eq!(config.worktrees_path(), PathBuf::from("/abs/state/worktrees"));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true", false));
        assert!(parse_bool("1", false));
        assert!(!parse_bool("false", true));
        assert!(!parse_bool("0", true));
        assert!(parse_bool("garbage", true));
    }

    #[test]
    fn test_preview_url_forces_port_3000() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("RENDER_EXTERNAL_URL");
        std::env::set_var("PREVIEW_URL", "https://preview.example.com");
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = base_config(temp.path().to_path_buf());
        config.port = 9999;
        config.apply_preview_url_port_override();
        assert_eq!(config.port, 3000);
        std::env::remove_var("PREVIEW_URL");
    }
}
