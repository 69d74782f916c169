//! GitHub event payloads and their decoding into [`TriggerEvent`]s.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::info;

use triage_core::{CommentEvent, IssueAction, IssueEvent, IssueRef, TriageError, TriggerEvent};

/// The subset of a GitHub `issues` / `issue_comment` payload the bot reads.
#[derive(Debug, Deserialize)]
pub struct GitHubEventPayload {
    pub action: Option<String>,
    pub issue: Option<Issue>,
    pub comment: Option<Comment>,
    pub repository: Option<Repository>,
    pub sender: Option<User>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Issue {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Comment {
    pub body: String,
    pub user: Option<User>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

#[derive(Debug, Deserialize, Clone)]
pub struct User {
    pub login: String,
}

/// Turn a raw payload into the event the pipeline acts on.
///
/// `actor` is the login that triggered the run (`GITHUB_ACTOR` in actions,
/// absent for webhooks, where the payload's `sender` is used instead).
/// `fallback_repo` is an `owner/name` string used when the payload carries
/// no repository.
pub fn decode_event(
    event_name: &str,
    payload: &GitHubEventPayload,
    actor: Option<&str>,
    fallback_repo: Option<&str>,
) -> Result<TriggerEvent> {
    let action = payload.action.as_deref().unwrap_or("");

    let Some(issue) = &payload.issue else {
        return Ok(ignored(format!("{} event without an issue", event_name)));
    };

    match (event_name, action) {
        ("issue_comment", "created") => {
            let Some(comment) = &payload.comment else {
                return Ok(ignored("issue_comment event without a comment".to_string()));
            };
            let actor = actor
                .map(str::to_string)
                .or_else(|| payload.sender.as_ref().map(|s| s.login.clone()))
                .ok_or(TriageError::MissingSender)?;

            Ok(TriggerEvent::CommentCreated(CommentEvent {
                issue: issue_ref(payload, issue, fallback_repo)?,
                body: comment.body.clone(),
                actor,
            }))
        }
        ("issues", action) => match action.parse::<IssueAction>() {
            Ok(action) => Ok(TriggerEvent::Issue(IssueEvent {
                action,
                issue: issue_ref(payload, issue, fallback_repo)?,
                title: issue.title.clone(),
                body: issue.body.clone(),
                author: issue.user.as_ref().map(|u| u.login.clone()),
                sender: payload.sender.as_ref().map(|s| s.login.clone()),
            })),
            Err(other) => Ok(ignored(format!("issues action '{}' is not handled", other))),
        },
        (name, action) => Ok(ignored(format!(
            "{} event with action '{}' is not handled",
            name, action
        ))),
    }
}

fn ignored(reason: String) -> TriggerEvent {
    info!("Ignoring event: {}", reason);
    TriggerEvent::Ignored { reason }
}

fn issue_ref(
    payload: &GitHubEventPayload,
    issue: &Issue,
    fallback_repo: Option<&str>,
) -> Result<IssueRef> {
    if let Some(repo) = &payload.repository {
        return Ok(IssueRef::new(&repo.owner.login, &repo.name, issue.number));
    }

    let full_name = fallback_repo.ok_or_else(|| anyhow!("Event payload names no repository"))?;
    let (owner, name) = full_name
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
        .ok_or_else(|| anyhow!("Repository must be in owner/name form, got '{}'", full_name))?;
    Ok(IssueRef::new(owner, name, issue.number))
}
