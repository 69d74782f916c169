pub mod command;
pub mod error;
pub mod normalize;
pub mod render;
pub mod rule;
pub mod settings;
pub mod state_machine;

pub use command::{decide_lock, LockCommand, LockDecision};
pub use error::{ConfigError, PatternError, TriageError};
pub use normalize::normalize;
pub use render::{render, render_with_context, ClosureNotice, TemplateContext, NO_MATCH};
pub use rule::{EvaluationOutcome, MatchResult, Rule, RuleJudgment, RuleKind, RuleSet};
pub use settings::{TriageSettings, DEFAULT_BOT_LOGIN};
pub use state_machine::*;
