//! Message rendering.
//!
//! Rule messages are operator-written templates. Two kinds of token are
//! recognised and nothing else is ever interpreted:
//! - `{match}`: the text the rule's pattern captured
//! - `${field}`: one of a fixed set of event fields, see [`TemplateContext`]
//!
//! Substitution is a single left-to-right pass. Inserted text is never
//! scanned again, so a captured `${sender.login}` in an issue title stays
//! literal.

/// Token replaced by the rule's captured text.
pub const MATCH_PLACEHOLDER: &str = "{match}";

/// Stands in for the captured text when there is none.
pub const NO_MATCH: &str = "<No match>";

/// Event fields a message template may refer to.
///
/// Unset fields leave their token untouched in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    pub issue_author: Option<String>,
    pub issue_number: Option<u64>,
    pub issue_title: Option<String>,
    pub sender: Option<String>,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
}

impl TemplateContext {
    fn lookup(&self, field: &str) -> Option<String> {
        match field {
            "issue.user.login" => self.issue_author.clone(),
            "issue.number" => self.issue_number.map(|n| n.to_string()),
            "issue.title" => self.issue_title.clone(),
            "sender.login" => self.sender.clone(),
            "repository.owner" => self.repo_owner.clone(),
            "repository.name" => self.repo_name.clone(),
            _ => None,
        }
    }
}

/// Replace every `{match}` in `template` with `captured`, or with
/// [`NO_MATCH`] when nothing was captured.
pub fn render(template: &str, captured: Option<&str>) -> String {
    render_with_context(template, captured, &TemplateContext::default())
}

/// Like [`render`], additionally substituting `${field}` tokens from `ctx`.
pub fn render_with_context(
    template: &str,
    captured: Option<&str>,
    ctx: &TemplateContext,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '$']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix(MATCH_PLACEHOLDER) {
            out.push_str(captured.unwrap_or(NO_MATCH));
            rest = after;
        } else if let Some((field, after)) = split_field_token(tail) {
            match ctx.lookup(field) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&tail[..tail.len() - after.len()]),
            }
            rest = after;
        } else {
            // Both '{' and '$' are single-byte.
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Split `${field}rest` into `(field, rest)`.
fn split_field_token(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix("${")?;
    let end = inner.find('}')?;
    let field = &inner[..end];
    let well_formed = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
    well_formed.then(|| (field, &inner[end + 1..]))
}

/// Which explanation a closing comment gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureNotice {
    /// The issue was just opened and is being closed.
    AutomaticallyClosed,
    /// The issue was edited while closed and stays closed.
    NotReopened,
}

impl ClosureNotice {
    fn phrase(self) -> &'static str {
        match self {
            ClosureNotice::AutomaticallyClosed => "automatically closed",
            ClosureNotice::NotReopened => "not reopened",
        }
    }
}

/// Build the comment posted when an issue fails one or more rules.
///
/// ```text
/// @author this issue was automatically closed because:
///
/// - first message
/// - second message
/// ```
pub fn closing_comment(author: Option<&str>, notice: ClosureNotice, messages: &[String]) -> String {
    let header = match author {
        Some(login) => format!("@{} this issue was {} because:\n", login, notice.phrase()),
        None => format!("This issue was {} because:\n", notice.phrase()),
    };

    let mut body = header;
    for message in messages {
        body.push_str("\n- ");
        body.push_str(message);
    }
    body
}
