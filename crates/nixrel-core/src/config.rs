//! Project configuration (`nixrel.yaml`)
//!
//! ```yaml
//! project_name: foo
//! release:
//!   github: { owner: foo, name: foo }
//! nix:
//!   - ids: [foo]
//!     license: mit
//!     dependencies:
//!       - name: fish
//!       - name: ttyd
//!         os: linux
//!     repository:
//!       owner: foo
//!       name: nur
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Top-level project file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project name, used as default package name
    #[serde(default)]
    pub project_name: String,

    /// Build output directory
    #[serde(default = "default_dist")]
    pub dist: PathBuf,

    /// Where release assets are downloaded from
    #[serde(default)]
    pub release: ReleaseConfig,

    /// Nix packages to generate
    #[serde(default)]
    pub nix: Vec<NixPackage>,
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for Project {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            dist: default_dist(),
            release: ReleaseConfig::default(),
            nix: Vec::new(),
        }
    }
}

impl Project {
    /// Load a project file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ProjectNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a project from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let project: Self = serde_yaml::from_str(content)?;
        if project.project_name.trim().is_empty() {
            return Err(CoreError::InvalidProject {
                message: "project_name must be set".to_string(),
            });
        }
        Ok(project)
    }
}

/// Release hosting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Repository the release assets are attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<ReleaseRepo>,

    /// Base URL for downloads
    #[serde(default = "default_download")]
    pub download: String,
}

fn default_download() -> String {
    "https://github.com".to_string()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            github: None,
            download: default_download(),
        }
    }
}

impl ReleaseConfig {
    /// Base URL under which assets of release `tag` are downloadable
    pub fn release_url(&self, tag: &str) -> String {
        match &self.github {
            Some(repo) => format!(
                "{}/{}/{}/releases/download/{}",
                self.download.trim_end_matches('/'),
                repo.owner,
                repo.name,
                tag
            ),
            None => String::new(),
        }
    }
}

/// Owner and name of a hosted repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRepo {
    pub owner: String,
    pub name: String,
}

/// A Nix package request
///
/// String fields are templates expanded against the release context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NixPackage {
    /// Package name (defaults to the project name)
    #[serde(default)]
    pub name: String,

    /// Artifact identifiers that belong to this package (empty = all)
    #[serde(default)]
    pub ids: Vec<String>,

    /// amd64 micro-architecture level to package (defaults to `v1`)
    #[serde(default)]
    pub goamd64: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub homepage: String,

    /// A `lib.licenses` attribute name
    #[serde(default)]
    pub license: String,

    /// Path of the manifest inside the repository
    #[serde(default)]
    pub path: String,

    /// Download URL template for each archive
    #[serde(default)]
    pub url_template: String,

    /// `true`, `auto`, or anything else to upload
    #[serde(default)]
    pub skip_upload: String,

    #[serde(default)]
    pub commit_msg_template: String,

    #[serde(default)]
    pub commit_author: CommitAuthor,

    #[serde(default)]
    pub dependencies: Vec<NixDependency>,

    /// Custom install script, replaces the generated one
    #[serde(default)]
    pub install: String,

    /// Appended to the install script
    #[serde(default)]
    pub extra_install: String,

    #[serde(default)]
    pub post_install: String,

    #[serde(default)]
    pub repository: RepoRef,
}

/// Runtime dependency wrapped into the binaries' PATH
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NixDependency {
    pub name: String,

    #[serde(default)]
    pub os: DependencyOs,
}

impl NixDependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os: DependencyOs::Any,
        }
    }

    pub fn linux(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os: DependencyOs::Linux,
        }
    }

    pub fn darwin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os: DependencyOs::Darwin,
        }
    }
}

/// OS scope of a dependency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyOs {
    #[default]
    #[serde(rename = "", alias = "any")]
    Any,
    Linux,
    Darwin,
}

/// Repository the manifest is committed to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoRef {
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub name: String,

    /// Branch to commit to (repository default when empty)
    #[serde(default)]
    pub branch: String,

    /// Access token template, e.g. `{{ env.NUR_TOKEN }}`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    #[serde(default)]
    pub pull_request: PullRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub draft: bool,

    /// Repository the pull request targets (defaults to `repository`)
    #[serde(default)]
    pub base: PullRequestBase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestBase {
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub branch: String,
}

/// Author of the manifest commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl Default for CommitAuthor {
    fn default() -> Self {
        Self {
            name: "nixrelbot".to_string(),
            email: "bot@nixrel.dev".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project() {
        let project = Project::from_yaml(
            r#"
project_name: foo
release:
  github:
    owner: acme
    name: foo
nix:
  - ids: [foo]
    license: mit
    dependencies:
      - name: fish
      - name: ttyd
        os: linux
      - name: chromium
        os: darwin
    repository:
      owner: acme
      name: nur
      pull_request:
        enabled: true
"#,
        )
        .unwrap();

        assert_eq!(project.dist, PathBuf::from("dist"));
        assert_eq!(project.nix.len(), 1);

        let nix = &project.nix[0];
        assert_eq!(nix.ids, vec!["foo".to_string()]);
        assert_eq!(
            nix.dependencies,
            vec![
                NixDependency::new("fish"),
                NixDependency::linux("ttyd"),
                NixDependency::darwin("chromium"),
            ]
        );
        assert!(nix.repository.pull_request.enabled);
        assert_eq!(nix.commit_author, CommitAuthor::default());
    }

    #[test]
    fn test_empty_dependency_os() {
        let dep: NixDependency = serde_yaml::from_str("name: git\nos: \"\"").unwrap();
        assert_eq!(dep.os, DependencyOs::Any);
    }

    #[test]
    fn test_project_name_required() {
        let err = Project::from_yaml("nix: []").unwrap_err();
        assert!(matches!(err, CoreError::InvalidProject { .. }));
    }

    #[test]
    fn test_release_url() {
        let mut release = ReleaseConfig::default();
        assert_eq!(release.release_url("v1.0.0"), "");

        release.github = Some(ReleaseRepo {
            owner: "acme".to_string(),
            name: "foo".to_string(),
        });
        assert_eq!(
            release.release_url("v1.0.0"),
            "https://github.com/acme/foo/releases/download/v1.0.0"
        );
    }

    #[test]
    fn test_missing_project_file() {
        let err = Project::load(Path::new("/definitely/not/here/nixrel.yaml")).unwrap_err();
        assert!(matches!(err, CoreError::ProjectNotFound { .. }));
    }
}
