//! nixrel Repo - repository clients for publishing manifests
//!
//! - [`RepositoryClient`]: the capability the publish workflow calls
//! - [`GitHubClient`]: GitHub REST API (contents, merge-upstream, pulls)
//! - [`FileClient`]: local directory tree, for dry runs
//! - [`MockClient`]: in-memory, records calls for tests

pub mod client;
pub mod error;
pub mod file;
pub mod github;
pub mod mock;

pub use client::{CommitFile, NewPullRequest, Repo, RepositoryClient};
pub use error::{RepoError, Result};
pub use file::FileClient;
pub use github::{DEFAULT_API_URL, GitHubClient};
pub use mock::{Call, MockClient, Operation, OperationCounts};
