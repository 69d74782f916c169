//! Effect interpreter.
//!
//! The boundary between the pure decisions in `triage-core` and the issue
//! tracker. Effects run in order and the first failure stops the rest.

use anyhow::{Context, Result};
use tracing::info;

use crate::tracker::IssueTracker;
use triage_core::{Effect, IssueRef};

/// Execute `effects` against `issue`, returning how many ran.
///
/// With `dry_run` set, effects are only logged.
pub async fn execute_effects(
    tracker: &dyn IssueTracker,
    issue: &IssueRef,
    effects: Vec<Effect>,
    dry_run: bool,
) -> Result<usize> {
    let mut executed = 0;

    for effect in effects {
        if dry_run {
            info!("[dry run] Would apply {:?} to {}", effect, issue);
            continue;
        }
        execute_effect(tracker, issue, effect).await?;
        executed += 1;
    }

    Ok(executed)
}

async fn execute_effect(tracker: &dyn IssueTracker, issue: &IssueRef, effect: Effect) -> Result<()> {
    match effect {
        Effect::PostComment { body } => tracker
            .create_comment(issue, &body)
            .await
            .with_context(|| format!("Failed to comment on {}", issue)),

        Effect::SetState { state } => tracker
            .set_issue_state(issue, state)
            .await
            .with_context(|| format!("Failed to set {} to {}", issue, state)),

        Effect::Lock => tracker
            .lock_issue(issue)
            .await
            .with_context(|| format!("Failed to lock {}", issue)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{InMemoryTracker, TrackerCall};
    use triage_core::{IssueSnapshot, IssueState};

    fn issue_ref() -> IssueRef {
        IssueRef::new("acme", "widgets", 3)
    }

    async fn tracker_with_issue(tracker: InMemoryTracker) -> InMemoryTracker {
        tracker
            .insert_issue(IssueSnapshot {
                issue: issue_ref(),
                title: Some("t".to_string()),
                body: None,
                state: IssueState::Open,
                labels: vec![],
                closed_by: None,
                author: None,
            })
            .await;
        tracker
    }

    fn close_with_comment() -> Vec<Effect> {
        vec![
            Effect::PostComment {
                body: "closing".to_string(),
            },
            Effect::SetState {
                state: IssueState::Closed,
            },
        ]
    }

    #[tokio::test]
    async fn test_effects_run_in_order() {
        let tracker = tracker_with_issue(InMemoryTracker::new()).await;
        let executed = execute_effects(&tracker, &issue_ref(), close_with_comment(), false)
            .await
            .unwrap();

        assert_eq!(executed, 2);
        assert_eq!(
            tracker.calls().await,
            vec![
                TrackerCall::CreateComment {
                    issue: issue_ref(),
                    body: "closing".to_string()
                },
                TrackerCall::SetState {
                    issue: issue_ref(),
                    state: IssueState::Closed
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_effects() {
        let tracker = tracker_with_issue(InMemoryTracker::new().with_failing_comments()).await;
        let err = execute_effects(&tracker, &issue_ref(), close_with_comment(), false)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to comment on acme/widgets#3"));
        assert!(tracker.calls().await.is_empty());
        let snapshot = tracker.issue(&issue_ref()).await.unwrap();
        assert_eq!(snapshot.state, IssueState::Open);
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let tracker = tracker_with_issue(InMemoryTracker::new()).await;
        let executed = execute_effects(&tracker, &issue_ref(), close_with_comment(), true)
            .await
            .unwrap();

        assert_eq!(executed, 0);
        assert!(tracker.calls().await.is_empty());
    }
}
