//! CLI commands

pub mod build;
pub mod check;
pub mod publish;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nixrel_core::{ArtifactList, Project, ReleaseContext};

use crate::error::{CliError, Result};

/// Release being packaged
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub tag: String,
    pub previous_tag: Option<String>,
    pub snapshot: bool,
}

/// Load the project file and apply package defaults
pub fn load_project(config: &Path) -> Result<Project> {
    let mut project = Project::load(config)?;
    nixrel_pipe::defaults(&mut project)?;
    tracing::debug!(
        config = %config.display(),
        packages = project.nix.len(),
        "loaded project"
    );
    Ok(project)
}

/// Artifact list location, `<dist>/artifacts.json` unless given
pub fn artifacts_path(project: &Project, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project.dist.join("artifacts.json"))
}

pub fn load_artifacts(path: &Path) -> Result<ArtifactList> {
    if !path.exists() {
        return Err(CliError::Io {
            message: format!("artifact list not found: {}", path.display()),
        });
    }
    Ok(ArtifactList::load(path)?)
}

/// Template context for the release
pub fn release_context(project: &Project, release: &ReleaseOptions) -> Result<ReleaseContext> {
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let mut ctx = ReleaseContext::new(&project.project_name, &release.tag)?
        .with_snapshot(release.snapshot)
        .with_release_url(project.release.release_url(&release.tag))
        .with_env(env);
    if let Some(previous) = &release.previous_tag {
        ctx = ctx.with_previous_tag(previous);
    }
    Ok(ctx)
}
