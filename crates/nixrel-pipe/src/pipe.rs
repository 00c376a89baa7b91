//! Build and publish phases
//!
//! The build phase renders every package with placeholder hashes and writes
//! the manifests under `<dist>/nix`. The publish phase re-renders them with
//! real hashes and commits them to their repositories.

use std::fmt;
use std::path::PathBuf;

use futures::future::join_all;
use nixrel_core::{
    Artifact, ArtifactKind, ArtifactList, CommitAuthor, NixPackage, Project, ReleaseContext,
    is_valid_license,
};
use nixrel_engine::Engine;
use nixrel_repo::{CommitFile, NewPullRequest, Repo, RepositoryClient};

use crate::error::{PipeError, Result};
use crate::fields::{self, PackageFields};
use crate::hasher::{FileHasher, HashStrategy, PLACEHOLDER_HASH};
use crate::install;
use crate::manifest::{self, DEFAULT_URL_TEMPLATE, RenderRequest};
use crate::resolve::resolve;

/// amd64 micro-architecture level packaged by default
pub const DEFAULT_GOAMD64: &str = "v1";

/// Commit message used when a package sets none
pub const DEFAULT_COMMIT_MSG_TEMPLATE: &str = "{{ project_name }}: {{ previous_tag }} -> {{ tag }}";

const PULL_REQUEST_BODY: &str = "Automated with nixrel";

/// Apply package defaults and validate the configuration
///
/// Runs before any artifact is looked at.
pub fn defaults(project: &mut Project) -> Result<()> {
    for pkg in &mut project.nix {
        if pkg.name.is_empty() {
            pkg.name = project.project_name.clone();
        }
        if pkg.goamd64.is_empty() {
            pkg.goamd64 = DEFAULT_GOAMD64.to_string();
        }
        if pkg.commit_msg_template.is_empty() {
            pkg.commit_msg_template = DEFAULT_COMMIT_MSG_TEMPLATE.to_string();
        }
        if pkg.url_template.is_empty() {
            pkg.url_template = DEFAULT_URL_TEMPLATE.to_string();
        }
        if pkg.commit_author.name.is_empty() || pkg.commit_author.email.is_empty() {
            pkg.commit_author = CommitAuthor::default();
        }

        if !is_valid_license(&pkg.license) {
            return Err(PipeError::InvalidLicense {
                license: pkg.license.clone(),
            });
        }
        if pkg.repository.name.is_empty() {
            return Err(PipeError::MissingRepositoryName {
                package: pkg.name.clone(),
            });
        }
        if pkg.url_template == DEFAULT_URL_TEMPLATE && project.release.github.is_none() {
            return Err(PipeError::MissingReleaseRepository {
                package: pkg.name.clone(),
            });
        }
    }
    Ok(())
}

/// A manifest written by the build phase
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPackage {
    pub name: String,
    /// Path inside the package repository
    pub repo_path: String,
    /// Where the manifest was written
    pub local_path: PathBuf,
    pub manifest: String,
}

/// Render every package with placeholder hashes and write the manifests
///
/// Nothing is written unless every package renders. Each manifest is recorded
/// in `artifacts` as a [`ArtifactKind::NixPackage`], replacing the entry of a
/// previous build of the same package.
pub async fn build_all(
    project: &Project,
    artifacts: &mut ArtifactList,
    ctx: &ReleaseContext,
    engine: &Engine,
) -> Result<Vec<BuiltPackage>> {
    let mut rendered = Vec::with_capacity(project.nix.len());
    for pkg in &project.nix {
        let (fields, manifest) = render_package(pkg, artifacts, ctx, engine, HashStrategy::Placeholder, 1).await?;
        rendered.push((fields, manifest));
    }

    let nix_dir = project.dist.join("nix");
    let mut built = Vec::with_capacity(rendered.len());
    for (fields, manifest) in rendered {
        let local_path = nix_dir.join(&fields.path);
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&local_path, &manifest).await?;
        tracing::info!(package = %fields.name, path = %local_path.display(), "wrote nix manifest");

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut artifact = Artifact::new(file_name, &local_path, ArtifactKind::NixPackage);
        artifact.extra.id = fields.name.clone();
        artifacts.replace(artifact);

        built.push(BuiltPackage {
            name: fields.name,
            repo_path: fields.path,
            local_path,
            manifest,
        });
    }
    Ok(built)
}

async fn render_package(
    pkg: &NixPackage,
    artifacts: &ArtifactList,
    ctx: &ReleaseContext,
    engine: &Engine,
    strategy: HashStrategy<'_>,
    concurrency: usize,
) -> Result<(PackageFields, String)> {
    let fields = PackageFields::expand(engine, ctx, pkg)?;
    let archives = resolve(artifacts, &pkg.ids, &pkg.goamd64)?;
    let hashes = strategy
        .hash_all(archives.iter().map(|a| a.artifact.path.as_path()), concurrency)
        .await?;
    let fragments = install::compose(&pkg.dependencies);

    let manifest = manifest::render(
        engine,
        ctx,
        &RenderRequest {
            package: pkg,
            fields: &fields,
            archives: &archives,
            hashes: &hashes,
            fragments: &fragments,
        },
    )?;

    if !strategy.is_placeholder() && manifest.contains(PLACEHOLDER_HASH) {
        return Err(PipeError::PlaceholderHashLeaked {
            package: fields.name,
        });
    }
    Ok((fields, manifest))
}

/// Why a package was not published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `skip_upload: true`
    SkipUpload,
    /// `skip_upload: auto` on a prerelease or snapshot
    Auto,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SkipUpload => f.write_str("skip_upload is set"),
            SkipReason::Auto => f.write_str("prerelease or snapshot with skip_upload: auto"),
        }
    }
}

/// Evaluate an expanded `skip_upload` value
pub fn skip_reason(skip_upload: &str, ctx: &ReleaseContext) -> Option<SkipReason> {
    match skip_upload.trim() {
        "true" => Some(SkipReason::SkipUpload),
        "auto" if ctx.is_prerelease() => Some(SkipReason::Auto),
        _ => None,
    }
}

/// What happened to one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published {
        repository: String,
        path: String,
        pull_request: Option<String>,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    pub outcome: PublishOutcome,
}

/// Result of the publish phase
#[derive(Debug, Clone, Default)]
pub struct PublishSummary {
    pub packages: Vec<PackageReport>,
}

impl PublishSummary {
    pub fn published(&self) -> impl Iterator<Item = &PackageReport> {
        self.packages
            .iter()
            .filter(|p| matches!(p.outcome, PublishOutcome::Published { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PackageReport> {
        self.packages
            .iter()
            .filter(|p| matches!(p.outcome, PublishOutcome::Skipped(_)))
    }
}

/// Options of the publish phase
#[derive(Clone, Copy)]
pub struct Publisher<'a> {
    pub engine: &'a Engine,
    pub hasher: &'a dyn FileHasher,
    pub client: &'a dyn RepositoryClient,
    /// Hashes computed at once per package
    pub concurrency: usize,
}

impl<'a> Publisher<'a> {
    pub fn new(engine: &'a Engine, hasher: &'a dyn FileHasher, client: &'a dyn RepositoryClient) -> Self {
        Self {
            engine,
            hasher,
            client,
            concurrency: crate::hasher::DEFAULT_HASH_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Publish every package
    ///
    /// Packages are published concurrently and independently; failures are
    /// collected and reported together once all packages are done.
    pub async fn publish_all(
        &self,
        project: &Project,
        artifacts: &ArtifactList,
        ctx: &ReleaseContext,
    ) -> Result<PublishSummary> {
        if !self.hasher.available() {
            return Err(PipeError::HasherUnavailable);
        }

        let results = join_all(
            project
                .nix
                .iter()
                .map(|pkg| self.publish(pkg, artifacts, ctx)),
        )
        .await;

        let mut summary = PublishSummary::default();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(report) => summary.packages.push(report),
                Err(err) => errors.push(err),
            }
        }

        match errors.len() {
            0 => Ok(summary),
            1 => Err(errors.remove(0)),
            _ => Err(PipeError::Multiple(errors)),
        }
    }

    /// Publish a single package
    pub async fn publish(
        &self,
        pkg: &NixPackage,
        artifacts: &ArtifactList,
        ctx: &ReleaseContext,
    ) -> Result<PackageReport> {
        let fields = PackageFields::expand(self.engine, ctx, pkg)?;
        if let Some(reason) = skip_reason(&fields.skip_upload, ctx) {
            tracing::info!(package = %fields.name, %reason, "skipping nix package");
            return Ok(PackageReport {
                name: fields.name,
                outcome: PublishOutcome::Skipped(reason),
            });
        }

        let (fields, manifest) = render_package(
            pkg,
            artifacts,
            ctx,
            self.engine,
            HashStrategy::Real(self.hasher),
            self.concurrency,
        )
        .await?;

        let message_template = if pkg.commit_msg_template.is_empty() {
            DEFAULT_COMMIT_MSG_TEMPLATE
        } else {
            pkg.commit_msg_template.as_str()
        };
        let message = fields::expand(self.engine, ctx, "commit_msg_template", message_template)?;

        let repo = Repo::new(&fields.repo_owner, &fields.repo_name)
            .with_branch(&fields.repo_branch)
            .with_token(&fields.repo_token);

        let pull_request = pkg.repository.pull_request.enabled;
        let base = Repo::new(
            or_default(&fields.base_owner, &fields.repo_owner),
            or_default(&fields.base_name, &fields.repo_name),
        )
        .with_branch(&fields.base_branch);

        if pull_request {
            tracing::debug!(head = %repo, base = %base, "syncing fork");
            self.client.sync_fork(&repo, &base).await?;
        }

        tracing::info!(package = %fields.name, repository = %repo, path = %fields.path, "pushing nix manifest");
        self.client
            .create_file(&CommitFile {
                repo: repo.clone(),
                path: fields.path.clone(),
                content: manifest,
                message: message.clone(),
                author: pkg.commit_author.clone(),
            })
            .await?;

        let pull_request = if pull_request {
            self.client
                .open_pull_request(&NewPullRequest {
                    base,
                    head: repo.clone(),
                    title: message,
                    body: PULL_REQUEST_BODY.to_string(),
                    draft: pkg.repository.pull_request.draft,
                })
                .await?
        } else {
            None
        };

        Ok(PackageReport {
            name: fields.name,
            outcome: PublishOutcome::Published {
                repository: repo.full_name(),
                path: fields.path,
                pull_request,
            },
        })
    }
}

fn or_default<'s>(value: &'s str, fallback: &'s str) -> &'s str {
    if value.is_empty() { fallback } else { value }
}
