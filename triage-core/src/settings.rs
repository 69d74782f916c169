//! Operator settings shared by every event the bot handles.

use crate::command::LockCommand;
use crate::error::ConfigError;
use crate::rule::RuleSet;
use crate::state_machine::{IssueAction, DEFAULT_ALLOWED_ACTIONS};

/// Login the tracker records when a workflow's token closes an issue.
pub const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";

#[derive(Debug, Clone)]
pub struct TriageSettings {
    /// Raw JSON of the `rules` input. Parsed only for issue lifecycle
    /// events, so a bad value never blocks the lock command.
    pub rules: Option<String>,
    pub ignore_label: Option<String>,
    pub lock_command: Option<String>,
    pub triage_team_slug: Option<String>,
    /// Closer identity that marks an issue as closed by this bot.
    pub bot_login: String,
    pub allowed_actions: Vec<IssueAction>,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            rules: None,
            ignore_label: None,
            lock_command: None,
            triage_team_slug: None,
            bot_login: DEFAULT_BOT_LOGIN.to_string(),
            allowed_actions: DEFAULT_ALLOWED_ACTIONS.to_vec(),
        }
    }
}

impl TriageSettings {
    pub fn require_rules(&self) -> Result<RuleSet, ConfigError> {
        let raw = self
            .rules
            .as_deref()
            .ok_or_else(|| ConfigError::MissingInput("rules".to_string()))?;
        RuleSet::from_json(raw)
    }

    pub fn allows(&self, action: IssueAction) -> bool {
        self.allowed_actions.contains(&action)
    }

    /// The lock command, if both its prefix and the authorized team are set.
    pub fn lock_command(&self) -> Option<LockCommand> {
        LockCommand::from_settings(
            self.lock_command.as_deref(),
            self.triage_team_slug.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rules_is_a_config_error() {
        let settings = TriageSettings::default();
        let err = settings.require_rules().unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput(ref name) if name == "rules"));
    }

    #[test]
    fn test_rules_are_parsed_on_demand() {
        let settings = TriageSettings {
            rules: Some(r#"[{"type": "both", "regex": "spam", "message": "m"}]"#.to_string()),
            ..TriageSettings::default()
        };
        assert_eq!(settings.require_rules().unwrap().len(), 1);

        let malformed = TriageSettings {
            rules: Some("not json".to_string()),
            ..TriageSettings::default()
        };
        assert!(matches!(
            malformed.require_rules(),
            Err(ConfigError::MalformedRules(_))
        ));
    }

    #[test]
    fn test_default_allows_lifecycle_actions() {
        let settings = TriageSettings::default();
        assert!(settings.allows(IssueAction::Opened));
        assert!(settings.allows(IssueAction::Edited));
        assert!(settings.allows(IssueAction::Reopened));

        let narrowed = TriageSettings {
            allowed_actions: vec![IssueAction::Opened],
            ..TriageSettings::default()
        };
        assert!(!narrowed.allows(IssueAction::Edited));
    }
}
