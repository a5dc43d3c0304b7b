use crate::error::GithubError;
use crate::github::client::{GithubClient, Transport};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Workflow run states that make up the CI queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
}

impl RunStatus {
    pub const QUEUE: [RunStatus; 2] = [RunStatus::Queued, RunStatus::InProgress];

    /// Value used by the API's `status` query parameter and run field
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RunsPage {
    total_count: Option<u64>,
    #[serde(default)]
    workflow_runs: Vec<Value>,
}

/// Queue state of one repository at one instant
#[derive(Debug, Clone)]
pub struct RepoQueue {
    pub owner: String,
    pub repo: String,
    /// Raw workflow-run records, queued first then in-progress
    pub runs: Vec<Value>,
    pub queued: u64,
    pub in_progress: u64,
    pub timestamp: DateTime<Utc>,
}

impl<T: Transport> GithubClient<T> {
    /// Fetch queued and in-progress workflow runs for one repository.
    ///
    /// Counts come from the first page's `total_count`; runs are collected
    /// from every page.
    pub fn fetch_repo_queue(&self, owner: &str, repo: &str) -> Result<RepoQueue, GithubError> {
        let timestamp = Utc::now();
        let url = self.config().url(&format!("repos/{owner}/{repo}/actions/runs"));

        let mut runs = Vec::new();
        let mut queued = 0;
        let mut in_progress = 0;

        for status in RunStatus::QUEUE {
            let mut query = self.page_query();
            query.push(("status", status.as_str().to_string()));

            let mut count = None;
            self.get_pages(&url, &query, Some(repo), |page: RunsPage| {
                if count.is_none() {
                    count = Some(page.total_count.unwrap_or(0));
                }
                runs.extend(page.workflow_runs);
                Ok(())
            })?;

            match status {
                RunStatus::Queued => queued = count.unwrap_or(0),
                RunStatus::InProgress => in_progress = count.unwrap_or(0),
            }
        }

        tracing::debug!(owner, repo, queued, in_progress, runs = runs.len(), "fetched queue");
        Ok(RepoQueue {
            owner: owner.to_string(),
            repo: repo.to_string(),
            runs,
            queued,
            in_progress,
            timestamp,
        })
    }
}
