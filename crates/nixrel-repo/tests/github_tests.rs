//! GitHub client tests against a mock HTTP server

use nixrel_core::CommitAuthor;
use nixrel_repo::{CommitFile, GitHubClient, NewPullRequest, Repo, RepoError, RepositoryClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_repo(server: &MockServer, owner: &str, name: &str, default_branch: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}", owner, name)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "default_branch": default_branch })),
        )
        .mount(server)
        .await;
}

fn manifest(repo: Repo) -> CommitFile {
    CommitFile {
        repo,
        path: "pkgs/foo/default.nix".to_string(),
        content: "hello".to_string(),
        message: "foo: v1.0.0 -> v1.2.1".to_string(),
        author: CommitAuthor::default(),
    }
}

#[tokio::test]
async fn test_create_new_file_on_default_branch() {
    let server = MockServer::start().await;
    mount_repo(&server, "acme", "nur", "main").await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/nur/contents/pkgs/foo/default.nix"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/acme/nur/contents/pkgs/foo/default.nix"))
        .and(header("Authorization", "Bearer t0ken"))
        .and(body_partial_json(json!({
            "message": "foo: v1.0.0 -> v1.2.1",
            "content": "aGVsbG8=",
            "branch": "main",
            "committer": { "name": "nixrelbot", "email": "bot@nixrel.dev" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), Some("t0ken".to_string())).unwrap();
    client
        .create_file(&manifest(Repo::new("acme", "nur")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_existing_file_sends_sha() {
    let server = MockServer::start().await;
    mount_repo(&server, "acme", "nur", "main").await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/nur/contents/pkgs/foo/default.nix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "abc123" })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/acme/nur/contents/pkgs/foo/default.nix"))
        .and(body_partial_json(json!({ "sha": "abc123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    client
        .create_file(&manifest(Repo::new("acme", "nur").with_branch("main")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_branch_is_created_from_default() {
    let server = MockServer::start().await;
    mount_repo(&server, "me", "nur", "master").await;

    Mock::given(method("GET"))
        .and(path("/repos/me/nur/branches/foo-1.2.1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/me/nur/git/ref/heads/master"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "deadbeef" } })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/me/nur/git/refs"))
        .and(body_partial_json(json!({ "ref": "refs/heads/foo-1.2.1", "sha": "deadbeef" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/me/nur/contents/pkgs/foo/default.nix"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/me/nur/contents/pkgs/foo/default.nix"))
        .and(body_partial_json(json!({ "branch": "foo-1.2.1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    client
        .create_file(&manifest(Repo::new("me", "nur").with_branch("foo-1.2.1")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sync_fork() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/me/nur/merge-upstream"))
        .and(body_partial_json(json!({ "branch": "main" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    client
        .sync_fork(
            &Repo::new("me", "nur").with_branch("update"),
            &Repo::new("acme", "nur").with_branch("main"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sync_fork_default_base_branch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/nur"))
        .and(header("Authorization", "Bearer fork-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_branch": "master" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/me/nur/merge-upstream"))
        .and(body_partial_json(json!({ "branch": "master" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    client
        .sync_fork(
            &Repo::new("me", "nur")
                .with_branch("update-1.2.1")
                .with_token("fork-token"),
            &Repo::new("acme", "nur"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_open_pull_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/nur/pulls"))
        .and(header("Authorization", "Bearer fork-token"))
        .and(body_partial_json(json!({
            "head": "me:update",
            "base": "main",
            "title": "foo: v1.2.1",
            "draft": true
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "html_url": "https://github.com/acme/nur/pull/7" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    let url = client
        .open_pull_request(&NewPullRequest {
            base: Repo::new("acme", "nur").with_branch("main"),
            head: Repo::new("me", "nur")
                .with_branch("update")
                .with_token("fork-token"),
            title: "foo: v1.2.1".to_string(),
            body: String::new(),
            draft: true,
        })
        .await
        .unwrap();

    assert_eq!(url.as_deref(), Some("https://github.com/acme/nur/pull/7"));
}

#[tokio::test]
async fn test_existing_pull_request_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/nur/pulls"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation Failed",
            "errors": [{ "message": "A pull request already exists for me:update." }]
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    let url = client
        .open_pull_request(&NewPullRequest {
            base: Repo::new("acme", "nur").with_branch("main"),
            head: Repo::new("me", "nur").with_branch("update"),
            title: "foo".to_string(),
            body: String::new(),
            draft: false,
        })
        .await
        .unwrap();

    assert!(url.is_none());
}

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/nur"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_url(&server.uri(), None).unwrap();
    let err = client
        .create_file(&manifest(Repo::new("acme", "nur")))
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::AuthRequired { .. }));
}
