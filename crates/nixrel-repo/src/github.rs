//! GitHub REST client
//!
//! Files are committed through the contents API; missing branches are created
//! from the repository's default branch.

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{CommitFile, NewPullRequest, Repo, RepositoryClient};
use crate::error::{RepoError, Result};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Deserialize)]
struct ContentInfo {
    sha: String,
}

#[derive(Deserialize)]
struct PullRequestInfo {
    html_url: String,
}

#[derive(Serialize)]
struct Committer<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct PutContent<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    committer: Committer<'a>,
    author: Committer<'a>,
}

#[derive(Serialize)]
struct CreatePull<'a> {
    title: &'a str,
    head: String,
    base: &'a str,
    body: &'a str,
    draft: bool,
}

impl GitHubClient {
    /// Create a client for api.github.com
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    /// Create a client for a GitHub Enterprise (or test) endpoint
    pub fn with_base_url(base_url: &str, token: Option<String>) -> Result<Self> {
        Url::parse(base_url).map_err(|e| RepoError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("nixrel/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn request(&self, method: Method, repo: &Repo, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/repos/{}/{}{}",
            self.base_url, repo.owner, repo.name, path
        );
        let mut request = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        if let Some(token) = repo.token.as_ref().or(self.token.as_ref()) {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Map error statuses to repository errors
    async fn check(response: Response, repo: &Repo) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        match status {
            StatusCode::UNAUTHORIZED => Err(RepoError::AuthRequired { url }),
            StatusCode::FORBIDDEN => Err(RepoError::AuthFailed {
                message: format!("Access denied to {}", repo.full_name()),
            }),
            StatusCode::NOT_FOUND => Err(RepoError::RepositoryNotFound {
                repo: repo.full_name(),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(RepoError::RateLimited { retry_after })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(RepoError::HttpError {
                    status: status.as_u16(),
                    message: format!("{} failed: {}", url, body.trim()),
                })
            }
        }
    }

    async fn default_branch(&self, repo: &Repo) -> Result<String> {
        let response = self.request(Method::GET, repo, "").send().await?;
        let info: RepoInfo = Self::check(response, repo).await?.json().await?;
        Ok(info.default_branch)
    }

    /// Branch to use for `repo`, creating it from the default branch if needed
    async fn ensure_branch(&self, repo: &Repo) -> Result<String> {
        let default_branch = self.default_branch(repo).await?;
        if repo.branch.is_empty() || repo.branch == default_branch {
            return Ok(default_branch);
        }

        let response = self
            .request(Method::GET, repo, &format!("/branches/{}", repo.branch))
            .send()
            .await?;
        if response.status() != StatusCode::NOT_FOUND {
            Self::check(response, repo).await?;
            return Ok(repo.branch.clone());
        }

        tracing::info!(repo = %repo.full_name(), branch = %repo.branch, from = %default_branch, "creating branch");
        let response = self
            .request(Method::GET, repo, &format!("/git/ref/heads/{}", default_branch))
            .send()
            .await?;
        let base: GitRef = Self::check(response, repo).await?.json().await?;

        let response = self
            .request(Method::POST, repo, "/git/refs")
            .json(&serde_json::json!({
                "ref": format!("refs/heads/{}", repo.branch),
                "sha": base.object.sha,
            }))
            .send()
            .await?;
        Self::check(response, repo).await?;

        Ok(repo.branch.clone())
    }

    /// Blob sha of an existing file, required to update it
    async fn file_sha(&self, repo: &Repo, path: &str, branch: &str) -> Result<Option<String>> {
        let response = self
            .request(Method::GET, repo, &format!("/contents/{}", path))
            .query(&[("ref", branch)])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let info: ContentInfo = Self::check(response, repo).await?.json().await?;
        Ok(Some(info.sha))
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    async fn create_file(&self, file: &CommitFile) -> Result<()> {
        let repo = &file.repo;
        let branch = self.ensure_branch(repo).await?;
        let sha = self.file_sha(repo, &file.path, &branch).await?;

        let author = Committer {
            name: &file.author.name,
            email: &file.author.email,
        };
        let body = PutContent {
            message: &file.message,
            content: base64::engine::general_purpose::STANDARD.encode(file.content.as_bytes()),
            branch: &branch,
            sha,
            committer: Committer {
                name: author.name,
                email: author.email,
            },
            author,
        };

        let response = self
            .request(Method::PUT, repo, &format!("/contents/{}", file.path))
            .json(&body)
            .send()
            .await?;
        Self::check(response, repo).await?;

        tracing::info!(repo = %repo.full_name(), %branch, path = %file.path, "committed file");
        Ok(())
    }

    async fn sync_fork(&self, head: &Repo, base: &Repo) -> Result<()> {
        // The head branch may not exist yet; the fork tracks upstream on the base branch.
        let branch = if base.branch.is_empty() {
            self.default_branch(&upstream(base, head)).await?
        } else {
            base.branch.clone()
        };

        tracing::info!(fork = %head.full_name(), upstream = %base.full_name(), %branch, "syncing fork");
        let response = self
            .request(Method::POST, head, "/merge-upstream")
            .json(&serde_json::json!({ "branch": branch }))
            .send()
            .await?;
        Self::check(response, head).await?;
        Ok(())
    }

    async fn open_pull_request(&self, pr: &NewPullRequest) -> Result<Option<String>> {
        let base = upstream(&pr.base, &pr.head);
        let base_branch = if base.branch.is_empty() {
            self.default_branch(&base).await?
        } else {
            base.branch.clone()
        };
        let head_branch = if pr.head.branch.is_empty() {
            self.default_branch(&pr.head).await?
        } else {
            pr.head.branch.clone()
        };

        let body = CreatePull {
            title: &pr.title,
            head: format!("{}:{}", pr.head.owner, head_branch),
            base: &base_branch,
            body: &pr.body,
            draft: pr.draft,
        };

        let response = self
            .request(Method::POST, &base, "/pulls")
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let text = response.text().await.unwrap_or_default();
            if text.contains("A pull request already exists") {
                tracing::warn!(base = %base.full_name(), head = %body.head, "pull request already exists");
                return Ok(None);
            }
            return Err(RepoError::HttpError {
                status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                message: text,
            });
        }

        let info: PullRequestInfo = Self::check(response, &base).await?.json().await?;
        tracing::info!(url = %info.html_url, "opened pull request");
        Ok(Some(info.html_url))
    }
}

/// `base` authenticated with the head's credentials when it has none
fn upstream(base: &Repo, head: &Repo) -> Repo {
    let mut upstream = base.clone();
    if upstream.token.is_none() {
        upstream.token = head.token.clone();
    }
    upstream
}
