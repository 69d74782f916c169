//! Pure triage decision function.
//!
//! Given the rule outcome, the triggering action and the issue's current
//! state, decide what happens to the issue. No I/O happens here; the
//! decision is lowered to [`Effect`]s for the interpreter.

use tracing::info;

use super::effect::Effect;
use super::event::{IssueAction, IssueEvent};
use super::state::{IssueSnapshot, IssueState};
use crate::error::PatternError;
use crate::render::{closing_comment, ClosureNotice, TemplateContext};
use crate::rule::{EvaluationOutcome, RuleSet};

/// What should happen to an issue after its rules were evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageDecision {
    /// Close the issue and explain why.
    CloseWithComment {
        notice: ClosureNotice,
        messages: Vec<String>,
    },
    /// Close (or keep closed) without commenting again.
    CloseSilently,
    /// The issue now passes and this bot had closed it: reopen.
    ReopenIfAutoClosed,
    NoOp,
}

impl TriageDecision {
    /// Lower the decision to effects. `author` is mentioned in any comment.
    pub fn into_effects(self, author: Option<&str>) -> Vec<Effect> {
        match self {
            TriageDecision::CloseWithComment { notice, messages } => vec![
                Effect::PostComment {
                    body: closing_comment(author, notice, &messages),
                },
                Effect::SetState {
                    state: IssueState::Closed,
                },
            ],
            TriageDecision::CloseSilently => vec![Effect::SetState {
                state: IssueState::Closed,
            }],
            TriageDecision::ReopenIfAutoClosed => vec![Effect::SetState {
                state: IssueState::Open,
            }],
            TriageDecision::NoOp => vec![],
        }
    }
}

/// Decide the issue's next state.
///
/// Any failure closes the issue. A comment is only posted when it tells the
/// author something new: on `opened` while the issue is open, or on
/// `edited` while it is closed. A passing edit reopens the issue only if
/// `bot_login` is the closer of record.
pub fn decide(
    action: IssueAction,
    outcome: &EvaluationOutcome,
    snapshot: &IssueSnapshot,
    bot_login: &str,
) -> TriageDecision {
    if outcome.all_passed() {
        let auto_closed =
            snapshot.state == IssueState::Closed && snapshot.closed_by_login(bot_login);
        return if action == IssueAction::Edited && auto_closed {
            TriageDecision::ReopenIfAutoClosed
        } else {
            TriageDecision::NoOp
        };
    }

    let should_comment = matches!(
        (action, snapshot.state),
        (IssueAction::Opened, IssueState::Open) | (IssueAction::Edited, IssueState::Closed)
    );

    if !should_comment {
        return TriageDecision::CloseSilently;
    }

    let notice = match action {
        IssueAction::Opened => ClosureNotice::AutomaticallyClosed,
        IssueAction::Edited | IssueAction::Reopened => ClosureNotice::NotReopened,
    };

    TriageDecision::CloseWithComment {
        notice,
        messages: outcome.failure_messages(),
    }
}

/// Fields rule messages may reference, taken from the event and snapshot.
pub fn template_context(event: &IssueEvent, snapshot: &IssueSnapshot) -> TemplateContext {
    TemplateContext {
        issue_author: event.author.clone().or_else(|| snapshot.author.clone()),
        issue_number: Some(event.issue.number),
        issue_title: event.title.clone().or_else(|| snapshot.title.clone()),
        sender: event.sender.clone(),
        repo_owner: Some(event.issue.owner.clone()),
        repo_name: Some(event.issue.repo.clone()),
    }
}

/// Evaluate `rules` for one lifecycle event and decide the outcome.
///
/// An issue carrying `ignore_label` is left alone without evaluating any rule.
/// Rules test the title and body from the event; lifecycle state, labels and
/// closer come from the snapshot.
pub fn triage(
    rules: &RuleSet,
    ignore_label: Option<&str>,
    bot_login: &str,
    event: &IssueEvent,
    snapshot: &IssueSnapshot,
) -> Result<TriageDecision, PatternError> {
    if let Some(label) = ignore_label.filter(|l| !l.is_empty()) {
        if snapshot.has_label(label) {
            info!("Ignoring issue with label {}", label);
            return Ok(TriageDecision::NoOp);
        }
    }

    let ctx = template_context(event, snapshot);
    let outcome = rules.evaluate(event.title.as_deref(), event.body.as_deref(), &ctx)?;
    Ok(decide(event.action, &outcome, snapshot, bot_login))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Rule, RuleKind};
    use crate::state_machine::IssueRef;

    const BOT: &str = "github-actions[bot]";

    fn wip_rules() -> RuleSet {
        RuleSet::new(vec![Rule::new(
            RuleKind::Title,
            r"^\[WIP\]",
            "No WIP issues: {match}",
        )])
    }

    fn snapshot(state: IssueState, closed_by: Option<&str>) -> IssueSnapshot {
        IssueSnapshot {
            issue: IssueRef::new("acme", "widgets", 7),
            title: None,
            body: None,
            state,
            labels: vec![],
            closed_by: closed_by.map(str::to_string),
            author: Some("octocat".to_string()),
        }
    }

    fn event(action: IssueAction, title: &str) -> IssueEvent {
        IssueEvent {
            action,
            issue: IssueRef::new("acme", "widgets", 7),
            title: Some(title.to_string()),
            body: Some("details".to_string()),
            author: Some("octocat".to_string()),
            sender: Some("octocat".to_string()),
        }
    }

    fn run(action: IssueAction, title: &str, snap: &IssueSnapshot) -> TriageDecision {
        triage(&wip_rules(), None, BOT, &event(action, title), snap).unwrap()
    }

    #[test]
    fn test_opened_failing_issue_is_closed_with_comment() {
        let decision = run(
            IssueAction::Opened,
            "[WIP] fix bug",
            &snapshot(IssueState::Open, None),
        );
        assert_eq!(
            decision,
            TriageDecision::CloseWithComment {
                notice: ClosureNotice::AutomaticallyClosed,
                messages: vec!["No WIP issues: [WIP]".to_string()],
            }
        );
    }

    #[test]
    fn test_opened_failing_issue_effects() {
        let decision = run(
            IssueAction::Opened,
            "[WIP] fix bug",
            &snapshot(IssueState::Open, None),
        );
        assert_eq!(
            decision.into_effects(Some("octocat")),
            vec![
                Effect::PostComment {
                    body: "@octocat this issue was automatically closed because:\n\n- No WIP issues: [WIP]"
                        .to_string()
                },
                Effect::SetState {
                    state: IssueState::Closed
                },
            ]
        );
    }

    #[test]
    fn test_opened_failing_issue_already_closed_is_closed_silently() {
        let decision = run(
            IssueAction::Opened,
            "[WIP] fix bug",
            &snapshot(IssueState::Closed, Some(BOT)),
        );
        assert_eq!(decision, TriageDecision::CloseSilently);
    }

    #[test]
    fn test_edited_failing_closed_issue_says_not_reopened() {
        let decision = run(
            IssueAction::Edited,
            "[WIP] still",
            &snapshot(IssueState::Closed, Some(BOT)),
        );
        assert_eq!(
            decision,
            TriageDecision::CloseWithComment {
                notice: ClosureNotice::NotReopened,
                messages: vec!["No WIP issues: [WIP]".to_string()],
            }
        );
    }

    #[test]
    fn test_edited_failing_open_issue_is_closed_silently() {
        let decision = run(
            IssueAction::Edited,
            "[WIP] now",
            &snapshot(IssueState::Open, None),
        );
        assert_eq!(decision, TriageDecision::CloseSilently);
        assert_eq!(
            decision.into_effects(Some("octocat")),
            vec![Effect::SetState {
                state: IssueState::Closed
            }]
        );
    }

    #[test]
    fn test_reopened_failing_issue_is_closed_silently() {
        for state in [IssueState::Open, IssueState::Closed] {
            let decision = run(IssueAction::Reopened, "[WIP] again", &snapshot(state, None));
            assert_eq!(decision, TriageDecision::CloseSilently);
        }
    }

    #[test]
    fn test_opened_passing_issue_is_left_alone() {
        let decision = run(IssueAction::Opened, "fix bug", &snapshot(IssueState::Open, None));
        assert_eq!(decision, TriageDecision::NoOp);
        assert!(decision.into_effects(None).is_empty());
    }

    #[test]
    fn test_edited_passing_issue_closed_by_bot_is_reopened() {
        let decision = run(
            IssueAction::Edited,
            "fix bug",
            &snapshot(IssueState::Closed, Some(BOT)),
        );
        assert_eq!(decision, TriageDecision::ReopenIfAutoClosed);
        assert_eq!(
            decision.into_effects(None),
            vec![Effect::SetState {
                state: IssueState::Open
            }]
        );
    }

    #[test]
    fn test_edited_passing_issue_closed_by_human_stays_closed() {
        let decision = run(
            IssueAction::Edited,
            "fix bug",
            &snapshot(IssueState::Closed, Some("maintainer")),
        );
        assert_eq!(decision, TriageDecision::NoOp);
    }

    #[test]
    fn test_edited_passing_open_issue_is_not_touched() {
        // closed_by survives a manual reopen; an open issue must not be "reopened"
        let decision = run(
            IssueAction::Edited,
            "fix bug",
            &snapshot(IssueState::Open, Some(BOT)),
        );
        assert_eq!(decision, TriageDecision::NoOp);
    }

    #[test]
    fn test_reopened_passing_issue_is_not_touched() {
        let decision = run(
            IssueAction::Reopened,
            "fix bug",
            &snapshot(IssueState::Closed, Some(BOT)),
        );
        assert_eq!(decision, TriageDecision::NoOp);
    }

    #[test]
    fn test_ignore_label_skips_evaluation() {
        let mut snap = snapshot(IssueState::Open, None);
        snap.labels = vec!["bug".to_string(), "triage-ignore".to_string()];
        let decision = triage(
            &wip_rules(),
            Some("triage-ignore"),
            BOT,
            &event(IssueAction::Opened, "[WIP] fix bug"),
            &snap,
        )
        .unwrap();
        assert_eq!(decision, TriageDecision::NoOp);
    }

    #[test]
    fn test_ignore_label_skips_even_invalid_rules() {
        let mut snap = snapshot(IssueState::Open, None);
        snap.labels = vec!["triage-ignore".to_string()];
        let broken = RuleSet::new(vec![Rule::new(RuleKind::Title, "(", "m")]);
        let decision = triage(
            &broken,
            Some("triage-ignore"),
            BOT,
            &event(IssueAction::Opened, "x"),
            &snap,
        );
        assert_eq!(decision.unwrap(), TriageDecision::NoOp);
    }

    #[test]
    fn test_unrelated_label_does_not_skip() {
        let mut snap = snapshot(IssueState::Open, None);
        snap.labels = vec!["bug".to_string()];
        let decision = triage(
            &wip_rules(),
            Some("triage-ignore"),
            BOT,
            &event(IssueAction::Opened, "[WIP] fix bug"),
            &snap,
        )
        .unwrap();
        assert!(matches!(decision, TriageDecision::CloseWithComment { .. }));
    }

    #[test]
    fn test_invalid_pattern_propagates() {
        let broken = RuleSet::new(vec![Rule::new(RuleKind::Title, "[", "m")]);
        let result = triage(
            &broken,
            None,
            BOT,
            &event(IssueAction::Opened, "x"),
            &snapshot(IssueState::Open, None),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_all_failures_listed_in_rule_order() {
        let rules = RuleSet::new(vec![
            Rule::new(RuleKind::Body, "(details)", "Body says {match}"),
            Rule::new(RuleKind::Title, "(WIP)", "Title says {match}"),
        ]);
        let decision = triage(
            &rules,
            None,
            BOT,
            &event(IssueAction::Opened, "[WIP] x"),
            &snapshot(IssueState::Open, None),
        )
        .unwrap();
        assert_eq!(
            decision,
            TriageDecision::CloseWithComment {
                notice: ClosureNotice::AutomaticallyClosed,
                messages: vec![
                    "Body says details".to_string(),
                    "Title says WIP".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_template_context_prefers_event_fields() {
        let mut snap = snapshot(IssueState::Open, None);
        snap.author = Some("someone-else".to_string());
        snap.title = Some("old title".to_string());
        let ctx = template_context(&event(IssueAction::Edited, "new title"), &snap);
        assert_eq!(ctx.issue_author.as_deref(), Some("octocat"));
        assert_eq!(ctx.issue_title.as_deref(), Some("new title"));
        assert_eq!(ctx.issue_number, Some(7));
        assert_eq!(ctx.repo_owner.as_deref(), Some("acme"));
    }
}
