//! Pattern rules and their evaluation against issue text.

use std::sync::OnceLock;

use fancy_regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, PatternError};
use crate::normalize::normalize_opt;
use crate::render::{render_with_context, TemplateContext};

/// Which part of the issue a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Title,
    Body,
    /// Title first, then body.
    Both,
}

/// A single configured rule, as written in the `rules` input:
///
/// ```json
/// {"type": "title", "regex": "^\\[WIP\\]", "ignoreCase": true, "message": "No WIP issues: {match}"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(rename = "regex")]
    pub pattern: String,
    #[serde(default)]
    pub ignore_case: bool,
    pub message: String,
    #[serde(skip)]
    compiled: OnceLock<Regex>,
}

/// Outcome of testing one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    /// The pattern matched. `captured` is the first capture group, or the
    /// whole match when the pattern has no groups. It is `None` only when
    /// the pattern has a first group that did not take part in the match.
    Matched { captured: Option<String> },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn captured(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { captured } => captured.as_deref(),
            MatchResult::NoMatch => None,
        }
    }
}

impl Rule {
    pub fn new(kind: RuleKind, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            ignore_case: false,
            message: message.into(),
            compiled: OnceLock::new(),
        }
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self.compiled = OnceLock::new();
        self
    }

    /// The compiled pattern, built on first use and cached afterwards.
    pub fn regex(&self) -> Result<&Regex, PatternError> {
        if let Some(regex) = self.compiled.get() {
            return Ok(regex);
        }

        let regex = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .map_err(|source| PatternError {
                pattern: self.pattern.clone(),
                source,
            })?;

        Ok(self.compiled.get_or_init(|| regex))
    }

    /// Test the rule against the issue's title and/or body.
    ///
    /// Candidate texts are normalized and tried in order (title before body
    /// for [`RuleKind::Both`]); absent texts are skipped. The first match
    /// wins.
    pub fn evaluate(
        &self,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<MatchResult, PatternError> {
        let regex = self.regex()?;

        let candidates = match self.kind {
            RuleKind::Title => [title, None],
            RuleKind::Body => [body, None],
            RuleKind::Both => [title, body],
        };

        for text in candidates.into_iter().filter_map(normalize_opt) {
            let caps = regex.captures(&text).map_err(|source| PatternError {
                pattern: self.pattern.clone(),
                source,
            })?;
            if let Some(caps) = caps {
                return Ok(MatchResult::Matched {
                    captured: captured_text(&caps),
                });
            }
        }

        Ok(MatchResult::NoMatch)
    }
}

fn captured_text(caps: &Captures<'_>) -> Option<String> {
    let group = if caps.len() > 1 { 1 } else { 0 };
    caps.get(group).map(|m| m.as_str().to_string())
}

/// The verdict for one rule within a [`RuleSet`] evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleJudgment {
    /// Position of the rule in the configured list.
    pub index: usize,
    pub result: MatchResult,
    /// The rule's message, rendered against this result.
    pub message: String,
}

impl RuleJudgment {
    /// A rule fails when its pattern matches.
    pub fn failed(&self) -> bool {
        self.result.is_match()
    }
}

/// One judgment per configured rule, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationOutcome {
    pub judgments: Vec<RuleJudgment>,
}

impl EvaluationOutcome {
    /// Rendered messages of the failed rules, in rule order.
    pub fn failure_messages(&self) -> Vec<String> {
        self.judgments
            .iter()
            .filter(|j| j.failed())
            .map(|j| j.message.clone())
            .collect()
    }

    pub fn all_passed(&self) -> bool {
        !self.judgments.iter().any(RuleJudgment::failed)
    }
}

/// Ordered list of rules. Every rule is evaluated; there is no short circuit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse the JSON `rules` input.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compile every pattern up front, reporting the first that is invalid.
    pub fn validate(&self) -> Result<(), PatternError> {
        for rule in &self.rules {
            rule.regex()?;
        }
        Ok(())
    }

    /// Evaluate all rules against the issue text and render their messages.
    ///
    /// An invalid pattern aborts the evaluation; it is never treated as a pass.
    pub fn evaluate(
        &self,
        title: Option<&str>,
        body: Option<&str>,
        ctx: &TemplateContext,
    ) -> Result<EvaluationOutcome, PatternError> {
        let mut judgments = Vec::with_capacity(self.rules.len());

        for (index, rule) in self.rules.iter().enumerate() {
            let result = rule.evaluate(title, body)?;
            let message = render_with_context(&rule.message, result.captured(), ctx);

            if result.is_match() {
                info!("Failed: {}", message);
            } else {
                info!("Passed: {}", message);
            }

            judgments.push(RuleJudgment {
                index,
                result,
                message,
            });
        }

        Ok(EvaluationOutcome { judgments })
    }
}
