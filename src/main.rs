use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use bridge::boss_agent::RunnerBossAgent;
use bridge::config::Config;
use bridge::env_vars::env_vars_by_category;
use bridge::executor::{Executor, NullExecutor};
use bridge::git::WorktreeManager;
use bridge::logging;
use bridge::rest::{self, ApiState};
use bridge::runner::{HttpRunner, NoopRunner, Runner};
use bridge::session::store::{FileSessionStore, SessionStore};
use bridge::session::SessionManager;
use bridge::tracker::{LinearTracker, NoopTracker, Tracker};

#[derive(Parser)]
#[command(name = "claude-linear-bridge")]
#[command(about = "Issue-driven automation bridge between a tracker and autonomous coding sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook/session daemon (default if no subcommand given)
    Start,

    /// Write a template configuration file
    Init {
        /// Where to write the config (default: .bridge/config.toml)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify tracker connectivity with the configured credentials
    Test,
}

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { output }) => {
            let path = PathBuf::from(output.unwrap_or_else(|| ".bridge/config.toml".to_string()));
            match Config::write_template(&path) {
                Ok(()) => {
                    println!("Wrote template configuration to {}", path.display());
                    println!();
                    print_env_var_reference();
                    0
                }
                Err(e) => {
                    eprintln!("Error: failed to write config template: {e}");
                    1
                }
            }
        }
        Some(Commands::Test) => match run_test(cli.config.as_deref(), cli.debug).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e}");
                exit_code_for(&e)
            }
        },
        Some(Commands::Start) | None => match run_start(cli.config.as_deref(), cli.debug).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e}");
                exit_code_for(&e)
            }
        },
    }
}

/// Map a top-level failure to the documented exit code: 2 for a config
/// problem, 3 for a connectivity failure, 1 for anything else.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<bridge::errors::ConfigError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<bridge::errors::ApiError>().is_some() {
        return 3;
    }
    1
}

/// Prints every documented environment variable, grouped by category, as
/// reference output for `init`/`test`.
fn print_env_var_reference() {
    println!("Environment variables:");
    for (category, vars) in env_vars_by_category() {
        println!("  {}:", category.display_name());
        for var in vars {
            let requirement = if var.required { "required".to_string() } else { var.default.map(|d| format!("default: {d}")).unwrap_or_else(|| "optional".to_string()) };
            println!("    {} ({requirement}) - {}", var.name, var.description);
        }
    }
}

async fn run_test(config_path: Option<&str>, debug: bool) -> Result<()> {
    let config = Config::load(config_path).map_err(anyhow::Error::from)?;
    let _logging = logging::init_logging(&config, false, debug)?;

    print_env_var_reference();
    println!();

    let tracker: Arc<dyn Tracker> = if config.api_token.is_empty() {
        Arc::new(NoopTracker)
    } else {
        Arc::new(LinearTracker::new(config.api_token.clone()))
    };

    let user = tracker.get_current_user().await.map_err(anyhow::Error::from)?;
    println!("Tracker connectivity OK (authenticated as {user})");
    Ok(())
}

async fn run_start(config_path: Option<&str>, debug: bool) -> Result<()> {
    let config = Arc::new(Config::load(config_path).map_err(anyhow::Error::from)?);
    let logging_handle = logging::init_logging(&config, true, debug)?;
    if let Some(path) = &logging_handle.log_file_path {
        tracing::info!(log_file = %path.display(), "logging to file");
    }

    tracing::info!(port = config.port, tenant_id = %config.tenant_id, "starting bridge");

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(config.sessions_path()));
    let worktree_manager = Arc::new(WorktreeManager::new(config.worktrees_path()));
    let executor: Arc<dyn Executor> = Arc::new(NullExecutor);

    let tracker: Arc<dyn Tracker> = if config.api_token.is_empty() {
        Arc::new(NoopTracker)
    } else {
        Arc::new(LinearTracker::new(config.api_token.clone()))
    };

    let runner: Arc<dyn Runner> = match &config.boss_agent.runner_url {
        Some(url) => Arc::new(HttpRunner::new(url.clone(), config.boss_agent.runner_token.clone())),
        None => Arc::new(NoopRunner),
    };

    let runner_boss_agent = Arc::new(RunnerBossAgent::new(
        runner,
        tracker,
        config.boss_agent.clone(),
        config.project_root.display().to_string(),
        config.session_timeout_minutes * 60,
    ));

    let boss_agent_for_manager = config.boss_agent.enabled.then(|| runner_boss_agent.clone() as Arc<dyn bridge::boss_agent::BossAgent>);

    let sessions = SessionManager::new(store, worktree_manager, executor, boss_agent_for_manager, config.clone(), config.project_root.clone());

    let boss_agent_for_state = config.boss_agent.enabled.then_some(runner_boss_agent);

    let state = ApiState::new(sessions, config.clone(), boss_agent_for_state);
    rest::serve(state, config.port).await?;

    Ok(())
}
