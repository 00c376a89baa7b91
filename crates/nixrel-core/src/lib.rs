//! nixrel Core - shared types for the Nix packaging step
//!
//! This crate provides the foundational types used throughout nixrel:
//! - `Artifact`: A build output produced by an earlier release step
//! - `PlatformKey`: Normalized (os, arch, variant) tuple and the platform matrix
//! - `Project`: The `nixrel.yaml` configuration with its `nix` package requests
//! - `ReleaseContext`: Template rendering context for a release

pub mod artifact;
pub mod config;
pub mod context;
pub mod error;
pub mod license;
pub mod platform;

pub use artifact::{
    ArchiveFamily, ArchiveFormat, Artifact, ArtifactExtra, ArtifactKind, ArtifactList, Selection,
};
pub use config::{
    CommitAuthor, DependencyOs, NixDependency, NixPackage, Project, PullRequest, PullRequestBase,
    ReleaseConfig, ReleaseRepo, RepoRef,
};
pub use context::{ArtifactFields, ReleaseContext};
pub use error::{CoreError, Result};
pub use license::{VALID_LICENSES, is_valid_license};
pub use platform::{Arch, ArmVariant, Os, PlatformKey, Target};
