use anyhow::{Context, Result};
use axum::{http::StatusCode, response::Json, routing::get, Router};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use triage_bot::config::Config;
use triage_bot::payload::{decode_event, GitHubEventPayload};
use triage_bot::webhook::webhook_router;
use triage_bot::{handle_event, AppState, GitHubClient, PipelineOutcome};

/// Closes issues that break the repository's rules and locks issues on request
#[derive(Parser, Debug)]
#[command(name = "triage-bot")]
#[command(about = "Rule-based issue triage for GitHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Handle the event of the current workflow run
    Run(RunArgs),
    /// Receive issue events as GitHub webhooks
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Path to the JSON event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    /// Login that triggered the run
    #[arg(long, env = "GITHUB_ACTOR")]
    actor: Option<String>,

    /// Repository in owner/name form, used when the payload names none
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// If set, do not make any changes, just print what would be done
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Secret used to verify X-Hub-Signature-256
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: String,
}

async fn run(args: RunArgs) -> Result<()> {
    let config = Config::from_env();

    let raw = fs::read_to_string(&args.event_path)
        .with_context(|| format!("Failed to read event payload {}", args.event_path.display()))?;
    let payload: GitHubEventPayload =
        serde_json::from_str(&raw).context("Failed to parse event payload")?;

    let event = decode_event(
        &args.event_name,
        &payload,
        args.actor.as_deref(),
        args.repository.as_deref(),
    )?;

    let client = GitHubClient::new(&config.api_base, config.repo_token.as_deref())?;
    match handle_event(&client, &config.settings, event, args.dry_run).await? {
        PipelineOutcome::Ignored(reason) => info!("Nothing to do: {}", reason),
        PipelineOutcome::Triaged(decision) => info!("Triage finished: {:?}", decision),
        PipelineOutcome::Lock(decision) => info!("Lock command finished: {}", decision),
    }
    Ok(())
}

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "triage-bot"
    })))
}

async fn serve(args: ServeArgs) -> Result<()> {
    info!("Starting issue triage bot");

    let config = Config::from_env();
    config.settings.require_rules()?.validate()?;
    let client = GitHubClient::new(&config.api_base, Some(config.require_repo_token()?))?;

    let app_state = Arc::new(AppState {
        tracker: Arc::new(client),
        settings: config.settings,
        webhook_secret: args.webhook_secret,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(webhook_router(app_state.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    info!("Server listening on port {}", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Serve(args) => serve(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // workflow command: marks the run as failed with this message
            println!("::error::{:#}", e);
            ExitCode::FAILURE
        }
    }
}
