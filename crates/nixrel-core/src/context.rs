//! Template rendering context

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::Serialize;

use crate::artifact::Artifact;
use crate::error::Result;

/// Context available to every templated field
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseContext {
    /// Project name from the project file
    pub project_name: String,

    /// Version without the `v` prefix
    pub version: String,

    /// Git tag being released
    pub tag: String,

    /// Previously released tag, empty on first release
    pub previous_tag: String,

    pub major: u64,
    pub minor: u64,
    pub patch: u64,

    /// Semver prerelease part, empty for final releases
    pub prerelease: String,

    pub is_snapshot: bool,

    /// Base URL of the release's downloadable assets
    pub release_url: String,

    /// Release date (RFC 3339)
    pub date: String,

    /// Release date as a Unix timestamp
    pub timestamp: i64,

    /// Environment variables exposed to templates
    pub env: BTreeMap<String, String>,

    /// Fields of the artifact being rendered, if any
    #[serde(flatten)]
    pub artifact: Option<ArtifactFields>,
}

/// Artifact information for per-archive templates (download URLs)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactFields {
    pub artifact_name: String,
    pub artifact_id: String,
    pub os: String,
    pub arch: String,
    pub arm: String,
    pub amd64: String,
}

impl From<&Artifact> for ArtifactFields {
    fn from(artifact: &Artifact) -> Self {
        Self {
            artifact_name: artifact.name.clone(),
            artifact_id: artifact.extra.id.clone(),
            os: artifact.os.clone(),
            arch: artifact.arch.clone(),
            arm: artifact.arm.clone(),
            amd64: artifact.amd64.clone(),
        }
    }
}

impl ReleaseContext {
    /// Create a context for releasing `tag`
    ///
    /// The version is the tag without its `v` prefix and must be valid semver.
    pub fn new(project_name: impl Into<String>, tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        let version = tag.trim_start_matches('v').to_string();
        let parsed = Version::parse(&version)?;
        let now = Utc::now();

        Ok(Self {
            project_name: project_name.into(),
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease: parsed.pre.to_string(),
            version,
            tag,
            previous_tag: String::new(),
            is_snapshot: false,
            release_url: String::new(),
            date: now.to_rfc3339(),
            timestamp: now.timestamp(),
            env: BTreeMap::new(),
            artifact: None,
        })
    }

    pub fn with_previous_tag(mut self, previous_tag: impl Into<String>) -> Self {
        self.previous_tag = previous_tag.into();
        self
    }

    pub fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.is_snapshot = snapshot;
        self
    }

    pub fn with_release_url(mut self, release_url: impl Into<String>) -> Self {
        self.release_url = release_url.into();
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date.to_rfc3339();
        self.timestamp = date.timestamp();
        self
    }

    /// Copy of this context with the fields of `artifact` added
    pub fn with_artifact(&self, artifact: &Artifact) -> Self {
        let mut ctx = self.clone();
        ctx.artifact = Some(ArtifactFields::from(artifact));
        ctx
    }

    /// Prereleases and snapshots are not meant for stable package sets
    pub fn is_prerelease(&self) -> bool {
        self.is_snapshot || !self.prerelease.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;

    #[test]
    fn test_release_context() {
        let ctx = ReleaseContext::new("foo", "v1.2.1-rc1").unwrap();

        assert_eq!(ctx.version, "1.2.1-rc1");
        assert_eq!(ctx.tag, "v1.2.1-rc1");
        assert_eq!((ctx.major, ctx.minor, ctx.patch), (1, 2, 1));
        assert_eq!(ctx.prerelease, "rc1");
        assert!(ctx.is_prerelease());
    }

    #[test]
    fn test_final_release() {
        let ctx = ReleaseContext::new("foo", "2.0.0").unwrap();
        assert_eq!(ctx.version, "2.0.0");
        assert!(!ctx.is_prerelease());
        assert!(ctx.with_snapshot(true).is_prerelease());
    }

    #[test]
    fn test_invalid_version() {
        assert!(ReleaseContext::new("foo", "vnext").is_err());
    }

    #[test]
    fn test_artifact_fields_serialized_flat() {
        let mut art = Artifact::new("foo_linux_arm64.tar.gz", "dist/foo", ArtifactKind::UploadableArchive);
        art.os = "linux".to_string();
        art.arch = "arm64".to_string();

        let ctx = ReleaseContext::new("foo", "v1.0.0").unwrap();
        let plain = serde_json::to_value(&ctx).unwrap();
        assert!(plain.get("artifact_name").is_none());

        let json = serde_json::to_value(ctx.with_artifact(&art)).unwrap();
        assert_eq!(json["artifact_name"], "foo_linux_arm64.tar.gz");
        assert_eq!(json["arch"], "arm64");
        assert_eq!(json["version"], "1.0.0");
    }
}
