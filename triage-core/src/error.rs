//! Error types for rule configuration and evaluation.
//!
//! A rule that simply does not match is not an error; it is a normal
//! `MatchResult::NoMatch`. Everything here aborts the whole run.

use thiserror::Error;

/// Problems with the operator-supplied configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required input was absent or empty.
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    /// The `rules` input is not a JSON array of rule objects.
    #[error("Malformed rules payload: {0}")]
    MalformedRules(#[from] serde_json::Error),
}

/// A rule's `regex` could not be compiled, or gave up while matching.
#[derive(Debug, Error)]
#[error("Invalid regular expression `{pattern}`: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: fancy_regex::Error,
}

/// Umbrella error for a single triage invocation.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Lifecycle events must name the user that triggered them.
    #[error("Internal error, no sender provided by GitHub")]
    MissingSender,
}
