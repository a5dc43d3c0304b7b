use crate::error::GithubError;
use crate::github::client::{GithubClient, Transport};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RunsSummary {
    total_count: Option<u64>,
}

/// Organisation plus the repositories to poll, as consumed by the queue fetcher.
///
/// The single-element `organisation` list mirrors the CI matrix format the
/// file is also fed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMatrix {
    pub organisation: Vec<String>,
    pub repository: Vec<String>,
}

impl RepoMatrix {
    /// Repository names are stored sorted
    pub fn new(org: impl Into<String>, mut repos: Vec<String>) -> Self {
        repos.sort();
        RepoMatrix {
            organisation: vec![org.into()],
            repository: repos,
        }
    }

    pub fn owner(&self) -> Result<&str, GithubError> {
        self.organisation
            .first()
            .map(String::as_str)
            .ok_or_else(|| GithubError::Config(String::from("matrix has no organisation")))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GithubError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GithubError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl<T: Transport> GithubClient<T> {
    /// Names of every repository in `org`, across all pages
    pub fn list_org_repos(&self, org: &str) -> Result<Vec<String>, GithubError> {
        tracing::info!(org, "start fetching repository names");
        let url = self.config().url(&format!("orgs/{org}/repos"));

        let mut repos = Vec::new();
        let pages = self.get_pages(&url, &self.page_query(), None, |page: Vec<RepoEntry>| {
            repos.extend(page.into_iter().map(|r| r.name));
            Ok(())
        })?;

        tracing::info!(org, count = repos.len(), pages, "finished fetching repository names");
        Ok(repos)
    }

    /// Whether the repository has ever run a GitHub Actions workflow
    pub fn uses_actions(&self, owner: &str, repo: &str) -> Result<bool, GithubError> {
        let url = self.config().url(&format!("repos/{owner}/{repo}/actions/runs"));
        let summary: RunsSummary = self.get_json(&url, &[], Some(repo))?;
        Ok(summary.total_count.unwrap_or(0) > 0)
    }

    /// Keep the repositories that use GitHub Actions, dropping duplicates
    pub fn repos_using_actions(
        &self,
        owner: &str,
        repos: &[String],
    ) -> Result<Vec<String>, GithubError> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = repos.iter().filter(|r| seen.insert(r.as_str())).collect();
        tracing::info!(count = unique.len(), "start checking which repositories use actions");

        let mut with_actions = Vec::new();
        for (i, repo) in unique.iter().enumerate() {
            tracing::debug!(checked = i + 1, "checking {owner}/{repo}");
            if self.uses_actions(owner, repo)? {
                tracing::debug!("{owner}/{repo} uses actions");
                with_actions.push((*repo).clone());
            }
        }

        tracing::info!(
            "finished checking which repositories use actions ({}/{})",
            with_actions.len(),
            unique.len()
        );
        Ok(with_actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::testing::{client, FakeTransport};
    use serde_json::json;

    #[test]
    fn test_list_org_repos_paginates() {
        let transport = FakeTransport::default();
        transport
            .push(
                json!([{"name": "airflow", "id": 1}, {"name": "beam", "id": 2}]),
                Some("https://api.github.com/organizations/47359/repos?page=2&per_page=100"),
            )
            .push(json!([{"name": "camel", "id": 3}]), None);

        let repos = client(&transport).list_org_repos("apache").unwrap();
        assert_eq!(repos, vec!["airflow", "beam", "camel"]);

        let requests = transport.requests.borrow();
        assert_eq!(requests[0].0, "https://api.github.com/orgs/apache/repos");
    }

    #[test]
    fn test_repos_using_actions_filters_and_dedups() {
        let transport = FakeTransport::default();
        transport
            .push(json!({"total_count": 12, "workflow_runs": []}), None)
            .push(json!({"total_count": 0, "workflow_runs": []}), None)
            .push(json!({"workflow_runs": []}), None);

        let repos = vec![
            String::from("airflow"),
            String::from("beam"),
            String::from("airflow"),
            String::from("camel"),
        ];
        let with_actions = client(&transport)
            .repos_using_actions("apache", &repos)
            .unwrap();

        assert_eq!(with_actions, vec!["airflow"]);
        assert_eq!(transport.requests.borrow().len(), 3);
        assert_eq!(
            transport.requests.borrow()[1].0,
            "https://api.github.com/repos/apache/beam/actions/runs"
        );
    }

    #[test]
    fn test_matrix_round_trip_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.json");

        let matrix = RepoMatrix::new("apache", vec![String::from("beam"), String::from("airflow")]);
        matrix.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"organisation": ["apache"], "repository": ["airflow", "beam"]}));

        let loaded = RepoMatrix::load(&path).unwrap();
        assert_eq!(loaded.owner().unwrap(), "apache");
        assert_eq!(loaded, matrix);
    }

    #[test]
    fn test_matrix_without_organisation() {
        let matrix = RepoMatrix {
            organisation: vec![],
            repository: vec![String::from("airflow")],
        };
        assert!(matches!(matrix.owner(), Err(GithubError::Config(_))));
    }
}
