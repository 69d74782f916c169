//! Issue tracker abstraction.
//!
//! The pipeline talks to the tracker only through `IssueTracker`. The GitHub
//! implementation lives in `github`; `InMemoryTracker` keeps everything in
//! memory and records what was asked of it.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use triage_core::{IssueRef, IssueSnapshot, IssueState, DEFAULT_BOT_LOGIN};

/// Operations the bot needs from an issue tracker.
///
/// Every call is a single request; failures are returned, never retried.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_issue(&self, issue: &IssueRef) -> Result<IssueSnapshot>;

    /// Logins of the members of `team_slug` in `org`.
    async fn list_team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>>;

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<()>;

    async fn set_issue_state(&self, issue: &IssueRef, state: IssueState) -> Result<()>;

    async fn lock_issue(&self, issue: &IssueRef) -> Result<()>;
}

/// A mutating call made against an [`InMemoryTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    CreateComment { issue: IssueRef, body: String },
    SetState { issue: IssueRef, state: IssueState },
    Lock { issue: IssueRef },
}

/// In-memory tracker.
///
/// Closing an issue records `closer_login` as its closer, the way a real
/// tracker records the token's identity.
pub struct InMemoryTracker {
    issues: RwLock<HashMap<IssueRef, IssueSnapshot>>,
    teams: RwLock<HashMap<(String, String), Vec<String>>>,
    calls: RwLock<Vec<TrackerCall>>,
    closer_login: String,
    fail_comments: bool,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self {
            issues: RwLock::new(HashMap::new()),
            teams: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            closer_login: DEFAULT_BOT_LOGIN.to_string(),
            fail_comments: false,
        }
    }

    pub fn with_closer_login(mut self, login: impl Into<String>) -> Self {
        self.closer_login = login.into();
        self
    }

    /// Make every `create_comment` fail, as a tracker outage would.
    pub fn with_failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }

    pub async fn insert_issue(&self, snapshot: IssueSnapshot) {
        let mut issues = self.issues.write().await;
        issues.insert(snapshot.issue.clone(), snapshot);
    }

    pub async fn insert_team(&self, org: &str, team_slug: &str, members: &[&str]) {
        let mut teams = self.teams.write().await;
        teams.insert(
            (org.to_string(), team_slug.to_string()),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    pub async fn issue(&self, issue: &IssueRef) -> Option<IssueSnapshot> {
        self.issues.read().await.get(issue).cloned()
    }

    pub async fn calls(&self) -> Vec<TrackerCall> {
        self.calls.read().await.clone()
    }

    async fn record(&self, call: TrackerCall) {
        self.calls.write().await.push(call);
    }
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn get_issue(&self, issue: &IssueRef) -> Result<IssueSnapshot> {
        self.issue(issue)
            .await
            .ok_or_else(|| anyhow!("Issue {} not found", issue))
    }

    async fn list_team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>> {
        let teams = self.teams.read().await;
        teams
            .get(&(org.to_string(), team_slug.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("Team {}/{} not found", org, team_slug))
    }

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<()> {
        if self.fail_comments {
            return Err(anyhow!("Failed to comment on {}", issue));
        }
        self.get_issue(issue).await?;
        self.record(TrackerCall::CreateComment {
            issue: issue.clone(),
            body: body.to_string(),
        })
        .await;
        Ok(())
    }

    async fn set_issue_state(&self, issue: &IssueRef, state: IssueState) -> Result<()> {
        {
            let mut issues = self.issues.write().await;
            let snapshot = issues
                .get_mut(issue)
                .ok_or_else(|| anyhow!("Issue {} not found", issue))?;
            if state == IssueState::Closed && snapshot.state == IssueState::Open {
                snapshot.closed_by = Some(self.closer_login.clone());
            }
            snapshot.state = state;
        }
        self.record(TrackerCall::SetState {
            issue: issue.clone(),
            state,
        })
        .await;
        Ok(())
    }

    async fn lock_issue(&self, issue: &IssueRef) -> Result<()> {
        self.get_issue(issue).await?;
        self.record(TrackerCall::Lock {
            issue: issue.clone(),
        })
        .await;
        Ok(())
    }
}
