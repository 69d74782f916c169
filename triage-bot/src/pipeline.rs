//! Event dispatch: one entry point per event kind.

use anyhow::Result;
use tracing::info;

use crate::interpreter::execute_effects;
use crate::tracker::IssueTracker;
use triage_core::{
    decide_lock, triage, CommentEvent, IssueEvent, LockDecision, TriageDecision, TriageError,
    TriageSettings, TriggerEvent,
};

/// Terminal outcome of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Ignored(String),
    Triaged(TriageDecision),
    Lock(LockDecision),
}

pub async fn handle_event(
    tracker: &dyn IssueTracker,
    settings: &TriageSettings,
    event: TriggerEvent,
    dry_run: bool,
) -> Result<PipelineOutcome> {
    match event {
        TriggerEvent::Issue(issue_event) => {
            handle_issue_event(tracker, settings, issue_event, dry_run).await
        }
        TriggerEvent::CommentCreated(comment) => {
            handle_comment(tracker, settings, comment, dry_run).await
        }
        TriggerEvent::Ignored { reason } => Ok(PipelineOutcome::Ignored(reason)),
    }
}

async fn handle_issue_event(
    tracker: &dyn IssueTracker,
    settings: &TriageSettings,
    event: IssueEvent,
    dry_run: bool,
) -> Result<PipelineOutcome> {
    if !settings.allows(event.action) {
        return Ok(PipelineOutcome::Ignored(format!(
            "action '{}' is not configured",
            event.action
        )));
    }
    if event.sender.is_none() {
        return Err(TriageError::MissingSender.into());
    }
    let rules = settings.require_rules()?;

    let snapshot = tracker.get_issue(&event.issue).await?;
    info!(
        "Triaging {} ({} on a {} issue)",
        event.issue, event.action, snapshot.state
    );

    let decision = triage(
        &rules,
        settings.ignore_label.as_deref(),
        &settings.bot_login,
        &event,
        &snapshot,
    )?;
    info!("Decision for {}: {:?}", event.issue, decision);

    let author = event.author.as_deref().or(snapshot.author.as_deref());
    let effects = decision.clone().into_effects(author);
    execute_effects(tracker, &event.issue, effects, dry_run).await?;

    Ok(PipelineOutcome::Triaged(decision))
}

async fn handle_comment(
    tracker: &dyn IssueTracker,
    settings: &TriageSettings,
    comment: CommentEvent,
    dry_run: bool,
) -> Result<PipelineOutcome> {
    let Some(command) = settings.lock_command() else {
        return Ok(PipelineOutcome::Ignored(
            "lock command is not configured".to_string(),
        ));
    };
    if !command.is_invoked_by(&comment.body) {
        return Ok(PipelineOutcome::Ignored(
            "comment does not invoke the lock command".to_string(),
        ));
    }

    let members = match tracker
        .list_team_members(&comment.issue.owner, command.team_slug())
        .await
    {
        Ok(members) => Some(members),
        Err(e) => {
            info!("Failed to fetch the triage team members: {:#}", e);
            None
        }
    };

    let decision = decide_lock(&comment.actor, members.as_deref());
    info!(
        "Lock requested on {} by {}: {}",
        comment.issue, comment.actor, decision
    );

    execute_effects(tracker, &comment.issue, decision.clone().into_effects(), dry_run).await?;
    Ok(PipelineOutcome::Lock(decision))
}
