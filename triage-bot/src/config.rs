use std::env;

use triage_core::{ConfigError, TriageSettings, DEFAULT_BOT_LOGIN};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Required before any call to the tracker; see [`Config::require_repo_token`].
    pub repo_token: Option<String>,
    pub api_base: String,
    pub settings: TriageSettings,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source.
    ///
    /// Action inputs are read from `INPUT_<NAME>` variables, see [`input_env_name`].
    /// Nothing is validated here; each input is checked by the path that uses it.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| get_input(&lookup, name);

        let api_base = lookup("GITHUB_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Config {
            repo_token: input("repo-token"),
            api_base,
            settings: TriageSettings {
                rules: input("rules"),
                ignore_label: input("ignoreLabel"),
                lock_command: input("lock-command"),
                triage_team_slug: input("triage-team-slug"),
                bot_login: input("bot-login").unwrap_or_else(|| DEFAULT_BOT_LOGIN.to_string()),
                ..TriageSettings::default()
            },
        }
    }

    pub fn require_repo_token(&self) -> Result<&str, ConfigError> {
        self.repo_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingInput("repo-token".to_string()))
    }
}

/// Environment variable carrying an action input: `repo-token` is read from
/// `INPUT_REPO-TOKEN`, `ignoreLabel` from `INPUT_IGNORELABEL`.
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Read an input, trimmed. Empty values count as absent.
pub fn get_input<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&input_env_name(name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
