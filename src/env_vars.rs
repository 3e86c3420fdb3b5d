//! Centralized environment variable registry.
//!
//! Single source of truth for every environment variable this process
//! reads, consumed by the `init`/`test` CLI commands for documentation.
//! Named variables are applied directly; `BRIDGE__`-prefixed, `__`-separated
//! variables layer over the config file via the `config` crate (see
//! `config::Config::load`).

/// An environment variable definition.
#[derive(Debug, Clone)]
pub struct EnvVar {
    pub name: &'static str,
    pub description: &'static str,
    pub category: EnvVarCategory,
    pub required: bool,
    pub default: Option<&'static str>,
    pub example: Option<&'static str>,
}

/// Categories for organizing environment variables in documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarCategory {
    Authentication,
    Project,
    Session,
    Git,
    BossAgent,
    Logging,
}

impl EnvVarCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvVarCategory::Authentication => "Authentication",
            EnvVarCategory::Project => "Project",
            EnvVarCategory::Session => "Session",
            EnvVarCategory::Git => "Git",
            EnvVarCategory::BossAgent => "Boss Agent",
            EnvVarCategory::Logging => "Logging",
        }
    }

    pub fn all() -> &'static [EnvVarCategory] {
        &[
            EnvVarCategory::Authentication,
            EnvVarCategory::Project,
            EnvVarCategory::Session,
            EnvVarCategory::Git,
            EnvVarCategory::BossAgent,
            EnvVarCategory::Logging,
        ]
    }
}

/// Static registry of every documented environment variable.
pub static ENV_VARS: &[EnvVar] = &[
    // === Authentication ===
    EnvVar {
        name: "LINEAR_API_TOKEN",
        description: "API token used to authenticate against the tracker's GraphQL API",
        category: EnvVarCategory::Authentication,
        required: true,
        default: None,
        example: Some("lin_api_..."),
    },
    EnvVar {
        name: "LINEAR_ORGANIZATION_ID",
        description: "Tenant/workspace id; events from any other tenant are rejected",
        category: EnvVarCategory::Authentication,
        required: true,
        default: None,
        example: Some("8f3c1e20-..."),
    },
    EnvVar {
        name: "LINEAR_WEBHOOK_SECRET",
        description: "Shared secret used to verify the HMAC-SHA256 webhook signature; unset disables verification",
        category: EnvVarCategory::Authentication,
        required: false,
        default: None,
        example: Some("whsec_..."),
    },
    EnvVar {
        name: "CLAUDE_AGENT_USER_ID",
        description: "The agent's own tracker user id, used for assignment-trigger matching and bot-loop filtering",
        category: EnvVarCategory::Authentication,
        required: false,
        default: None,
        example: Some("user_8f3c1e"),
    },
    // === Project ===
    EnvVar {
        name: "PROJECT_ROOT_DIR",
        description: "Path to the git repository this bridge operates on",
        category: EnvVarCategory::Project,
        required: true,
        default: None,
        example: Some("/srv/repo"),
    },
    EnvVar {
        name: "WEBHOOK_PORT",
        description: "Port the HTTP server listens on",
        category: EnvVarCategory::Project,
        required: false,
        default: Some("3005"),
        example: Some("8080"),
    },
    EnvVar {
        name: "MAX_CONCURRENT_SESSIONS",
        description: "Upper bound on simultaneously active sessions",
        category: EnvVarCategory::Project,
        required: false,
        default: Some("16"),
        example: Some("8"),
    },
    // === Session ===
    EnvVar {
        name: "SESSION_TIMEOUT_MINUTES",
        description: "Minutes a session may run before it is cancelled as timed out",
        category: EnvVarCategory::Session,
        required: false,
        default: Some("30"),
        example: Some("60"),
    },
    // === Git ===
    EnvVar {
        name: "DEFAULT_BRANCH",
        description: "Base branch new session branches and worktrees are created from",
        category: EnvVarCategory::Git,
        required: false,
        default: Some("main"),
        example: Some("develop"),
    },
    EnvVar {
        name: "CREATE_BRANCHES",
        description: "Whether sessions create a dedicated branch and worktree",
        category: EnvVarCategory::Git,
        required: false,
        default: Some("true"),
        example: Some("false"),
    },
    // === Boss Agent ===
    EnvVar {
        name: "ENABLE_BOSS_AGENT",
        description: "Enable the delegation path; when off every session runs the direct executor",
        category: EnvVarCategory::BossAgent,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "BOSS_AGENT_THRESHOLD",
        description: "Minimum classified complexity (1-10) required to delegate a task",
        category: EnvVarCategory::BossAgent,
        required: false,
        default: Some("6"),
        example: Some("7"),
    },
    EnvVar {
        name: "RUNNER_URL",
        description: "Base URL of the external task runner; unset falls back to a no-op runner",
        category: EnvVarCategory::BossAgent,
        required: false,
        default: None,
        example: Some("https://runner.internal"),
    },
    EnvVar {
        name: "RUNNER_TOKEN",
        description: "Bearer token presented to the external task runner",
        category: EnvVarCategory::BossAgent,
        required: false,
        default: None,
        example: Some("rnr_..."),
    },
    EnvVar {
        name: "RUNNER_WEBHOOK_SECRET",
        description: "Shared secret verifying the runner's progress-callback webhook signature",
        category: EnvVarCategory::BossAgent,
        required: false,
        default: None,
        example: Some("whsec_..."),
    },
    // === Logging ===
    EnvVar {
        name: "DEBUG",
        description: "Force debug-level logging regardless of the configured log level",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
];

/// All env vars in a given category.
pub fn env_vars_for_category(category: EnvVarCategory) -> impl Iterator<Item = &'static EnvVar> {
    ENV_VARS.iter().filter(move |v| v.category == category)
}

/// Env vars grouped by category, empty categories omitted.
pub fn env_vars_by_category() -> Vec<(EnvVarCategory, Vec<&'static EnvVar>)> {
    EnvVarCategory::all()
        .iter()
        .map(|cat| {
            let vars: Vec<&EnvVar> = env_vars_for_category(*cat).collect();
            (*cat, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_env_vars_have_descriptions() {
        for var in ENV_VARS {
            assert!(!var.description.is_empty(), "EnvVar {} has empty description", var.name);
        }
    }

    #[test]
    fn test_required_vars_have_no_default() {
        for var in ENV_VARS {
            if var.required {
                assert!(var.default.is_none(), "required EnvVar {} should not declare a default", var.name);
            }
        }
    }

    #[test]
    fn test_env_vars_by_category_includes_authentication() {
        let grouped = env_vars_by_category();
        assert!(grouped.iter().any(|(cat, _)| *cat == EnvVarCategory::Authentication));
    }

    #[test]
    fn test_category_display_names() {
        assert_eq!(EnvVarCategory::Authentication.display_name(), "Authentication");
        assert_eq!(EnvVarCategory::BossAgent.display_name(), "Boss Agent");
    }

    #[test]
    fn test_all_categories_in_order() {
        let all = EnvVarCategory::all();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], EnvVarCategory::Authentication);
        assert_eq!(all[5], EnvVarCategory::Logging);
    }
}
