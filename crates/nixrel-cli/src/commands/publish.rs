//! Publish command - hash archives and push manifests

use console::style;
use nixrel_engine::Engine;
use nixrel_pipe::{NixHasher, PublishOutcome, Publisher};
use nixrel_repo::{FileClient, GitHubClient, RepositoryClient};
use std::path::{Path, PathBuf};

use super::{ReleaseOptions, artifacts_path, load_artifacts, load_project, release_context};
use crate::error::{CliError, Result};

/// Where manifests are pushed
#[derive(Debug, Clone)]
pub struct Target {
    /// Write into a local directory instead of calling the API
    pub repo_dir: Option<PathBuf>,
    pub api_url: String,
    pub token: Option<String>,
    pub concurrency: usize,
}

pub async fn run(
    config: &Path,
    artifacts: Option<&Path>,
    release: &ReleaseOptions,
    target: &Target,
) -> Result<()> {
    let project = load_project(config)?;
    if project.nix.is_empty() {
        println!("{} No nix packages configured", style("⚠").yellow());
        return Ok(());
    }

    let list = load_artifacts(&artifacts_path(&project, artifacts))?;
    let ctx = release_context(&project, release)?;

    let client: Box<dyn RepositoryClient> = match &target.repo_dir {
        Some(dir) => {
            println!(
                "{} Dry run, writing into {}",
                style("→").blue(),
                dir.display()
            );
            Box::new(FileClient::new(dir).map_err(nixrel_pipe::PipeError::from)?)
        }
        None => Box::new(
            GitHubClient::with_base_url(&target.api_url, target.token.clone())
                .map_err(nixrel_pipe::PipeError::from)?,
        ),
    };

    let engine = Engine::default();
    let hasher = NixHasher::new();
    let summary = Publisher::new(&engine, &hasher, client.as_ref())
        .with_concurrency(target.concurrency)
        .publish_all(&project, &list, &ctx)
        .await
        .map_err(CliError::from)?;

    for report in &summary.packages {
        match &report.outcome {
            PublishOutcome::Published {
                repository,
                path,
                pull_request,
            } => {
                println!(
                    "{} {} -> {}:{}",
                    style("✓").green(),
                    style(&report.name).bold(),
                    repository,
                    path
                );
                if let Some(url) = pull_request {
                    println!("  {} {}", style("Pull request:").dim(), url);
                }
            }
            PublishOutcome::Skipped(reason) => {
                println!(
                    "{} {} skipped: {}",
                    style("⚠").yellow(),
                    style(&report.name).bold(),
                    reason
                );
            }
        }
    }

    println!(
        "\n{} Published {}, skipped {}",
        style("✓").green().bold(),
        summary.published().count(),
        summary.skipped().count()
    );
    Ok(())
}
