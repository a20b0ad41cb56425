use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod github;
mod release;

use config::{BotConfig, Settings};
use github::GitHubClient;
use release::{Capabilities, DryRun, Outcome, ReleaseOrchestrator};

#[derive(Parser)]
#[command(name = "create-release-bot", version)]
#[command(about = "Tag and release pull requests marked for release once they merge")]
struct Cli {
    /// Repository owner
    #[arg(long, env = "INPUT_REPO_OWNER")]
    repo_owner: Option<String>,

    /// Repository name
    #[arg(long, env = "INPUT_REPO_NAME")]
    repo_name: Option<String>,

    #[arg(long, env = "INPUT_BASE_BRANCH")]
    base_branch: Option<String>,

    #[arg(long, env = "INPUT_TARGET_BRANCH")]
    target_branch: Option<String>,

    /// GitHub token
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Raw pull request event payload
    #[arg(long, env = "INPUT_GITHUB_EVENT", hide_env_values = true)]
    event: Option<String>,

    /// File holding the event payload, used when no raw payload is given
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Optional TOML file overriding labels, tagger and release naming
    #[arg(long, env = "INPUT_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, env = "INPUT_API_URL")]
    api_url: Option<String>,

    /// Log the writes instead of performing them
    #[arg(long, env = "INPUT_DRY_RUN")]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(outcome) => {
            info!(?outcome, "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    let settings = Settings::new(
        cli.repo_owner,
        cli.repo_name,
        cli.base_branch,
        cli.target_branch,
        cli.token,
    )
    .context("error loading env")?;

    let bot_config = match &cli.config {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };

    let client = GitHubClient::new(settings.token.clone(), cli.api_url.as_deref(), &bot_config.http)
        .context("error creating github client")?;

    let payload = github::event::load_payload(cli.event.as_deref(), cli.event_path.as_deref())?;
    let event = github::event::parse_pull_request_event(&payload)?;

    info!(
        owner = %settings.repo_owner,
        repo = %settings.repo_name,
        pr = event.pull_request.number,
        action = %event.action,
        dry_run = cli.dry_run,
        "handling pull request event"
    );

    let orchestrator = ReleaseOrchestrator::new(settings.repository(), &bot_config);
    let outcome = if cli.dry_run {
        let platform = DryRun::new(client);
        orchestrator
            .handle_event(&Capabilities::from_platform(&platform), &event)
            .await
    } else {
        orchestrator
            .handle_event(&Capabilities::from_platform(&client), &event)
            .await
    }
    .context("error handling pr event")?;

    Ok(outcome)
}
