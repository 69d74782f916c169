//! Events that drive triage.
//!
//! The two event shapes the bot reacts to are separate variants, each
//! carrying only the fields it guarantees.

use std::fmt;
use std::str::FromStr;

use super::state::IssueRef;

/// Issue lifecycle actions that trigger rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueAction {
    Opened,
    Edited,
    Reopened,
}

/// Actions recognised when no explicit set is configured.
pub const DEFAULT_ALLOWED_ACTIONS: [IssueAction; 3] = [
    IssueAction::Opened,
    IssueAction::Edited,
    IssueAction::Reopened,
];

impl IssueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueAction::Opened => "opened",
            IssueAction::Edited => "edited",
            IssueAction::Reopened => "reopened",
        }
    }
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(IssueAction::Opened),
            "edited" => Ok(IssueAction::Edited),
            "reopened" => Ok(IssueAction::Reopened),
            other => Err(other.to_string()),
        }
    }
}

/// An issue was opened, edited or reopened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEvent {
    pub action: IssueAction,
    pub issue: IssueRef,
    /// Title and body as they were when the event fired.
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
    /// Login of the user that triggered the event.
    pub sender: Option<String>,
}

/// A comment was created on an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    pub issue: IssueRef,
    pub body: String,
    /// Login of the commenter.
    pub actor: String,
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    Issue(IssueEvent),
    CommentCreated(CommentEvent),
    /// Anything the bot does not act on.
    Ignored { reason: String },
}
