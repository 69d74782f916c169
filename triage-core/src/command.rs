//! The lock command: a comment starting with a configured prefix, honoured
//! only for members of a configured team.

use std::fmt;

use crate::state_machine::Effect;

/// An enabled lock command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockCommand {
    prefix: String,
    team_slug: String,
}

impl LockCommand {
    /// Returns `None` (command disabled) unless both the prefix and the
    /// team slug are non-empty.
    pub fn from_settings(prefix: Option<&str>, team_slug: Option<&str>) -> Option<Self> {
        let prefix = prefix.filter(|p| !p.is_empty())?;
        let team_slug = team_slug.filter(|t| !t.is_empty())?;
        Some(Self {
            prefix: prefix.to_string(),
            team_slug: team_slug.to_string(),
        })
    }

    pub fn team_slug(&self) -> &str {
        &self.team_slug
    }

    /// Exact, case-sensitive prefix match on the raw comment body.
    pub fn is_invoked_by(&self, comment_body: &str) -> bool {
        comment_body.starts_with(&self.prefix)
    }
}

/// Result of checking the commenter against the team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockDecision {
    Lock,
    /// The commenter is not in the team.
    NotAuthorized,
    /// The member list could not be fetched. Fails closed.
    MembershipUnavailable,
}

impl fmt::Display for LockDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockDecision::Lock => write!(f, "lock"),
            LockDecision::NotAuthorized => write!(f, "not authorized"),
            LockDecision::MembershipUnavailable => write!(f, "membership unavailable"),
        }
    }
}

impl LockDecision {
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            LockDecision::Lock => vec![Effect::Lock],
            LockDecision::NotAuthorized | LockDecision::MembershipUnavailable => vec![],
        }
    }
}

/// Decide whether `actor` may lock. `members` is `None` when the lookup failed.
pub fn decide_lock(actor: &str, members: Option<&[String]>) -> LockDecision {
    match members {
        None => LockDecision::MembershipUnavailable,
        Some(members) if members.iter().any(|m| m == actor) => LockDecision::Lock,
        Some(_) => LockDecision::NotAuthorized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> LockCommand {
        LockCommand::from_settings(Some("/lock"), Some("maintainers")).unwrap()
    }

    #[test]
    fn test_disabled_without_team() {
        assert_eq!(LockCommand::from_settings(Some("/lock"), None), None);
        assert_eq!(LockCommand::from_settings(Some("/lock"), Some("")), None);
    }

    #[test]
    fn test_disabled_without_prefix() {
        // An empty prefix would otherwise match every comment
        assert_eq!(LockCommand::from_settings(None, Some("maintainers")), None);
        assert_eq!(LockCommand::from_settings(Some(""), Some("maintainers")), None);
    }

    #[test]
    fn test_prefix_match_is_exact_and_case_sensitive() {
        let command = lock();
        assert!(command.is_invoked_by("/lock"));
        assert!(command.is_invoked_by("/lock this is spam"));
        assert!(!command.is_invoked_by("/Lock"));
        assert!(!command.is_invoked_by(" /lock"));
        assert!(!command.is_invoked_by("please /lock"));
    }

    #[test]
    fn test_member_may_lock() {
        let members = vec!["alice".to_string(), "bob".to_string()];
        assert_eq!(decide_lock("bob", Some(members.as_slice())), LockDecision::Lock);
        assert_eq!(
            decide_lock("bob", Some(members.as_slice())).into_effects(),
            vec![Effect::Lock]
        );
    }

    #[test]
    fn test_non_member_may_not_lock() {
        let members = vec!["alice".to_string()];
        assert_eq!(decide_lock("mallory", Some(members.as_slice())), LockDecision::NotAuthorized);
        assert_eq!(decide_lock("Alice", Some(members.as_slice())), LockDecision::NotAuthorized);
        assert!(decide_lock("mallory", Some(members.as_slice())).into_effects().is_empty());
    }

    #[test]
    fn test_failed_lookup_fails_closed() {
        assert_eq!(decide_lock("alice", None), LockDecision::MembershipUnavailable);
        assert!(decide_lock("alice", None).into_effects().is_empty());
    }
}
