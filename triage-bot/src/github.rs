use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::tracker::IssueTracker;
use triage_core::{ConfigError, IssueRef, IssueSnapshot, IssueState};

/// Page size used when listing team members.
const MEMBERS_PAGE_SIZE: usize = 100;

/// GitHub REST client authenticated with a repository token.
///
/// The token is only demanded when a request is about to be sent, so events
/// that end before touching GitHub run without one.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCommentRequest<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateIssueRequest {
    pub state: IssueState,
}

#[derive(Debug, Deserialize)]
pub struct IssueResponse {
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<LabelResponse>,
    pub closed_by: Option<UserResponse>,
    pub user: Option<UserResponse>,
}

#[derive(Debug, Deserialize)]
pub struct LabelResponse {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub login: String,
}

impl IssueResponse {
    fn into_snapshot(self, issue: &IssueRef) -> IssueSnapshot {
        IssueSnapshot {
            issue: issue.clone(),
            title: self.title,
            body: self.body,
            state: self.state,
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            closed_by: self.closed_by.map(|u| u.login),
            author: self.user.map(|u| u.login),
        }
    }
}

impl GitHubClient {
    pub fn new(api_base: &str, token: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("triage-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }

    fn issue_url(&self, issue: &IssueRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_base, issue.owner, issue.repo, issue.number
        )
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingInput("repo-token".to_string()))?;

        Ok(request
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28"))
    }

    /// Turn a non-2xx response into an error carrying the status and body.
    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .context("Failed to read error response body")?;
        error!("GitHub API error {}: {} - {}", what, status, error_text);
        Err(anyhow!(
            "GitHub API error {}: {} - {}",
            what,
            status,
            error_text
        ))
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn get_issue(&self, issue: &IssueRef) -> Result<IssueSnapshot> {
        info!("Fetching issue {}", issue);

        let response = self
            .authorized(self.client.get(self.issue_url(issue)))?
            .send()
            .await
            .context("Failed to send issue request")?;
        let response = Self::ensure_success(response, "fetching issue").await?;

        let issue_response: IssueResponse = response
            .json()
            .await
            .context("Failed to parse issue response")?;
        Ok(issue_response.into_snapshot(issue))
    }

    async fn list_team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>> {
        let url = format!("{}/orgs/{}/teams/{}/members", self.api_base, org, team_slug);
        let per_page = MEMBERS_PAGE_SIZE.to_string();
        let mut members = Vec::new();
        let mut page = 1u32;

        info!("Fetching members of team {}/{}", org, team_slug);

        loop {
            let page_value = page.to_string();
            let response = self
                .authorized(self.client.get(&url))?
                .query(&[
                    ("per_page", per_page.as_str()),
                    ("page", page_value.as_str()),
                ])
                .send()
                .await
                .context("Failed to send team members request")?;
            let response = Self::ensure_success(response, "listing team members").await?;

            let chunk: Vec<UserResponse> = response
                .json()
                .await
                .context("Failed to parse team members response")?;
            let last_page = chunk.len() < MEMBERS_PAGE_SIZE;
            members.extend(chunk.into_iter().map(|u| u.login));

            if last_page {
                break;
            }
            page += 1;
        }

        info!("Team {}/{} has {} members", org, team_slug, members.len());
        Ok(members)
    }

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<()> {
        info!("Posting comment on {}", issue);

        let response = self
            .authorized(self.client.post(format!("{}/comments", self.issue_url(issue))))?
            .json(&CreateCommentRequest { body })
            .send()
            .await
            .context("Failed to send comment request")?;
        Self::ensure_success(response, "posting comment").await?;
        Ok(())
    }

    async fn set_issue_state(&self, issue: &IssueRef, state: IssueState) -> Result<()> {
        info!("Setting {} to {}", issue, state);

        let response = self
            .authorized(self.client.patch(self.issue_url(issue)))?
            .json(&UpdateIssueRequest { state })
            .send()
            .await
            .context("Failed to send issue update request")?;
        Self::ensure_success(response, "updating issue state").await?;
        Ok(())
    }

    async fn lock_issue(&self, issue: &IssueRef) -> Result<()> {
        info!("Locking {}", issue);

        let response = self
            .authorized(self.client.put(format!("{}/lock", self.issue_url(issue))))?
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("Failed to send lock request")?;
        Self::ensure_success(response, "locking issue").await?;
        Ok(())
    }
}
