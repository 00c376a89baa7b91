//! Mock repository client for testing
//!
//! Keeps committed files in memory and records every call in order, so tests
//! can assert on the exact sequence the publish workflow produced.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::{CommitFile, NewPullRequest, Repo, RepositoryClient};
use crate::error::{RepoError, Result};

/// A recorded client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateFile { repo: String, path: String },
    SyncFork { head: String, base: String },
    OpenPullRequest { head: String, base: String, draft: bool },
}

/// Operation that should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateFile,
    SyncFork,
    OpenPullRequest,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub files: usize,
    pub syncs: usize,
    pub pulls: usize,
}

/// In-memory repository client
#[derive(Clone, Default)]
pub struct MockClient {
    /// Storage: "owner/name" -> path -> content
    files: Arc<RwLock<HashMap<String, HashMap<String, String>>>>,
    calls: Arc<RwLock<Vec<Call>>>,
    fail_on: Option<Operation>,
}

impl MockClient {
    /// Create a new empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` fail
    pub fn failing_on(operation: Operation) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    /// All calls in the order they were made
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        let mut counts = OperationCounts::default();
        for call in self.calls() {
            match call {
                Call::CreateFile { .. } => counts.files += 1,
                Call::SyncFork { .. } => counts.syncs += 1,
                Call::OpenPullRequest { .. } => counts.pulls += 1,
            }
        }
        counts
    }

    /// Content committed at `path` in `owner/name`
    pub fn file(&self, repo: &str, path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(repo)
            .and_then(|files| files.get(path))
            .cloned()
    }

    fn record(&self, call: Call) {
        self.calls
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check(&self, operation: Operation) -> Result<()> {
        if self.fail_on == Some(operation) {
            return Err(RepoError::Other(format!("mock failure: {:?}", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryClient for MockClient {
    async fn create_file(&self, file: &CommitFile) -> Result<()> {
        self.record(Call::CreateFile {
            repo: file.repo.to_string(),
            path: file.path.clone(),
        });
        self.check(Operation::CreateFile)?;

        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(file.repo.full_name())
            .or_default()
            .insert(file.path.clone(), file.content.clone());
        Ok(())
    }

    async fn sync_fork(&self, head: &Repo, base: &Repo) -> Result<()> {
        self.record(Call::SyncFork {
            head: head.to_string(),
            base: base.to_string(),
        });
        self.check(Operation::SyncFork)
    }

    async fn open_pull_request(&self, pr: &NewPullRequest) -> Result<Option<String>> {
        self.record(Call::OpenPullRequest {
            head: pr.head.to_string(),
            base: pr.base.to_string(),
            draft: pr.draft,
        });
        self.check(Operation::OpenPullRequest)?;
        Ok(Some(format!("https://example.invalid/{}/pull/1", pr.base.full_name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixrel_core::CommitAuthor;

    fn commit(path: &str) -> CommitFile {
        CommitFile {
            repo: Repo::new("acme", "nur"),
            path: path.to_string(),
            content: "{ }".to_string(),
            message: "foo: v1.0.0".to_string(),
            author: CommitAuthor::default(),
        }
    }

    #[tokio::test]
    async fn test_create_file_is_stored() {
        let client = MockClient::new();
        client.create_file(&commit("pkgs/foo/default.nix")).await.unwrap();

        assert_eq!(
            client.file("acme/nur", "pkgs/foo/default.nix").as_deref(),
            Some("{ }")
        );
        assert_eq!(client.operation_counts().files, 1);
    }

    #[tokio::test]
    async fn test_failing_operation_is_recorded() {
        let client = MockClient::failing_on(Operation::CreateFile);
        assert!(client.create_file(&commit("a.nix")).await.is_err());
        assert_eq!(client.calls().len(), 1);
        assert!(client.file("acme/nur", "a.nix").is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = MockClient::new();
        let clone = client.clone();
        clone
            .sync_fork(&Repo::new("me", "nur"), &Repo::new("acme", "nur"))
            .await
            .unwrap();

        assert_eq!(
            client.calls(),
            vec![Call::SyncFork {
                head: "me/nur".to_string(),
                base: "acme/nur".to_string()
            }]
        );
    }
}
