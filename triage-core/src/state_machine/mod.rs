//! Explicit state machine for issue triage.
//!
//! The design separates:
//! - **State**: what the tracker reports about an issue (`IssueSnapshot`)
//! - **Events**: what happened (`TriggerEvent`)
//! - **Effects**: what to do (`Effect`)
//! - **Transition**: pure `(rules, event, snapshot) -> TriageDecision`
//!
//! The bot's interpreter executes effects against the tracker.

pub mod effect;
pub mod event;
pub mod state;
pub mod transition;

pub use effect::*;
pub use event::*;
pub use state::*;
pub use transition::*;
