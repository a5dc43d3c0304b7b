//! GitHub REST API collaborators
//!
//! Sequential, blocking calls only: listing an organisation's repositories,
//! checking which of them use GitHub Actions, and sampling each repository's
//! queued and in-progress workflow runs.

pub mod client;
pub mod queue;
pub mod rate_limit;
pub mod repos;

pub use client::{next_link, GithubClient, GithubConfig, HttpTransport, Response, Transport};
pub use queue::{RepoQueue, RunStatus};
pub use rate_limit::{check_response, RateLimit};
pub use repos::RepoMatrix;
