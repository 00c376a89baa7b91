//! The repository client capability
//!
//! The publish workflow only sequences calls on a [`RepositoryClient`]; all
//! transport lives in the implementations.

use std::fmt;

use async_trait::async_trait;
use nixrel_core::CommitAuthor;

use crate::error::Result;

/// A repository and the branch to operate on
///
/// An empty branch means the repository's default branch.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub name: String,
    pub branch: String,
    /// Access token overriding the client's default credentials
    pub token: Option<String>,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: String::new(),
            token: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the access token; empty tokens are ignored
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if !self.branch.is_empty() {
            write!(f, "@{}", self.branch)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repo")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A file to create or update with a single commit
#[derive(Debug, Clone)]
pub struct CommitFile {
    pub repo: Repo,
    /// Path inside the repository, e.g. `pkgs/foo/default.nix`
    pub path: String,
    pub content: String,
    pub message: String,
    pub author: CommitAuthor,
}

/// A pull request from `head` into `base`
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub base: Repo,
    pub head: Repo,
    pub title: String,
    pub body: String,
    pub draft: bool,
}

/// Version-control operations used to publish manifests
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Create or update a file on `file.repo`'s branch
    async fn create_file(&self, file: &CommitFile) -> Result<()>;

    /// Bring the fork `head` up to date with its upstream `base`
    async fn sync_fork(&self, head: &Repo, base: &Repo) -> Result<()>;

    /// Open a pull request, returning its URL when the backend has one
    async fn open_pull_request(&self, pr: &NewPullRequest) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_display() {
        let repo = Repo::new("acme", "nur");
        assert_eq!(repo.to_string(), "acme/nur");
        assert_eq!(repo.with_branch("update-foo").to_string(), "acme/nur@update-foo");
    }

    #[test]
    fn test_debug_redacts_token() {
        let repo = Repo::new("acme", "nur").with_token("ghp_secret");
        let debug = format!("{:?}", repo);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_empty_token_ignored() {
        assert_eq!(Repo::new("a", "b").with_token("").token, None);
    }
}
