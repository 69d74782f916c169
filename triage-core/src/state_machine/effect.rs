//! Effects (side effects as data).
//!
//! Decisions are lowered to effects; the bot's interpreter executes them
//! against the issue tracker in order.

use serde::{Deserialize, Serialize};

use super::state::IssueState;

/// Everything triage may ask the tracker to do to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Post a comment on the issue.
    PostComment { body: String },

    /// Open or close the issue. Closing an already closed issue is harmless.
    SetState { state: IssueState },

    /// Lock the issue's conversation.
    Lock,
}
