//! Local directory client
//!
//! Writes manifests into `<root>/<owner>/<name>/<path>` instead of a remote
//! repository. Useful for:
//! - Dry runs that should not touch a remote
//! - Reviewing generated manifests before enabling uploads

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::client::{CommitFile, NewPullRequest, Repo, RepositoryClient};
use crate::error::Result;

/// Directory-backed repository client
pub struct FileClient {
    root: PathBuf,
}

#[derive(Serialize)]
struct PullRequestRecord<'a> {
    title: &'a str,
    body: &'a str,
    head: String,
    base: String,
    draft: bool,
}

impl FileClient {
    /// Create a client rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repo_dir(&self, repo: &Repo) -> PathBuf {
        self.root.join(&repo.owner).join(&repo.name)
    }
}

#[async_trait]
impl RepositoryClient for FileClient {
    async fn create_file(&self, file: &CommitFile) -> Result<()> {
        let path = self.repo_dir(&file.repo).join(&file.path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &file.content).await?;

        tracing::info!(path = %path.display(), message = %file.message, "wrote file");
        Ok(())
    }

    async fn sync_fork(&self, head: &Repo, base: &Repo) -> Result<()> {
        // A local tree has no upstream to merge from.
        tracing::debug!(%head, %base, "skipping fork sync for local directory");
        Ok(())
    }

    async fn open_pull_request(&self, pr: &NewPullRequest) -> Result<Option<String>> {
        let dir = self.repo_dir(&pr.base).join(".pull-requests");
        tokio::fs::create_dir_all(&dir).await?;

        let branch = if pr.head.branch.is_empty() {
            "default"
        } else {
            pr.head.branch.as_str()
        };
        let path = dir.join(format!("{}-{}.json", pr.head.owner, branch.replace('/', "-")));

        let record = PullRequestRecord {
            title: &pr.title,
            body: &pr.body,
            head: pr.head.to_string(),
            base: pr.base.to_string(),
            draft: pr.draft,
        };
        tokio::fs::write(&path, serde_json::to_string_pretty(&record)?).await?;

        tracing::info!(path = %path.display(), "recorded pull request");
        Ok(Some(path.display().to_string()))
    }
}
