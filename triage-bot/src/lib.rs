pub mod config;
pub mod github;
pub mod interpreter;
pub mod payload;
pub mod pipeline;
pub mod tracker;
pub mod webhook;

use std::sync::Arc;

pub use github::GitHubClient;
pub use pipeline::{handle_event, PipelineOutcome};
pub use tracker::{InMemoryTracker, IssueTracker};

use triage_core::TriageSettings;

/// Identifies one webhook delivery across log lines.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

pub struct AppState {
    pub tracker: Arc<dyn IssueTracker>,
    pub settings: TriageSettings,
    pub webhook_secret: String,
}
