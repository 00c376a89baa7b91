//! Build artifacts consumed by the Nix packaging step
//!
//! Artifacts are produced by earlier release steps and read from
//! `dist/artifacts.json`. Both snake_case keys and the Go-style keys (`goos`,
//! `ID`, `Format`, ...) are accepted.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::platform::{Target, UNIVERSAL_ARCH};

/// Kind of artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A compressed archive meant to be uploaded to the release
    #[serde(rename = "Archive")]
    UploadableArchive,
    /// A bare binary meant to be uploaded to the release
    #[serde(rename = "Binary")]
    UploadableBinary,
    /// A generated Nix package manifest
    #[serde(rename = "Nixpkg")]
    NixPackage,
    /// Anything this step does not care about
    #[serde(other)]
    Other,
}

/// Archive format, with the short aliases normalized away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    TarXz,
    TarZst,
    Tar,
    Binary,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarXz => "tar.xz",
            ArchiveFormat::TarZst => "tar.zst",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Binary => "binary",
        }
    }

    pub fn family(&self) -> ArchiveFamily {
        match self {
            ArchiveFormat::Zip => ArchiveFamily::Zip,
            ArchiveFormat::Binary => ArchiveFamily::Binary,
            ArchiveFormat::TarGz | ArchiveFormat::TarXz | ArchiveFormat::TarZst | ArchiveFormat::Tar => {
                ArchiveFamily::Tar
            }
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            "tar.xz" | "txz" => Ok(ArchiveFormat::TarXz),
            "tar.zst" | "tzst" => Ok(ArchiveFormat::TarZst),
            "tar" => Ok(ArchiveFormat::Tar),
            "binary" => Ok(ArchiveFormat::Binary),
            other => Err(CoreError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// How an archive gets unpacked and installed
///
/// The declaration order is the order install fragments are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFamily {
    Binary,
    Tar,
    Zip,
}

impl ArchiveFamily {
    pub const ALL: [ArchiveFamily; 3] = [ArchiveFamily::Binary, ArchiveFamily::Tar, ArchiveFamily::Zip];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFamily::Binary => "binary",
            ArchiveFamily::Tar => "tar",
            ArchiveFamily::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of an artifact when archives are matched to platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Covers every architecture of its OS
    Universal,
    /// A single-architecture archive; `replaces_universal` makes it win over
    /// a universal binary for its own platform
    PerArch { replaces_universal: bool },
}

/// Extra attributes attached by the step that produced the artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactExtra {
    /// Identifier of the build/archive configuration that produced it
    #[serde(default, alias = "ID")]
    pub id: String,

    /// Archive format as written by the archiver (aliases allowed)
    #[serde(default, alias = "Format")]
    pub format: String,

    /// Binaries contained in the archive
    #[serde(default, alias = "Binaries")]
    pub binaries: Vec<String>,

    /// Directory the binaries are wrapped in inside the archive
    #[serde(default, alias = "WrappedIn", skip_serializing_if = "String::is_empty")]
    pub wrapped_in: String,

    /// Whether this per-arch archive replaces a universal binary
    #[serde(default, alias = "Replaces", skip_serializing_if = "Option::is_none")]
    pub replaces: Option<bool>,
}

/// A single build output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,

    pub path: PathBuf,

    #[serde(default, alias = "goos")]
    pub os: String,

    #[serde(default, alias = "goarch")]
    pub arch: String,

    #[serde(default, alias = "goarm")]
    pub arm: String,

    #[serde(default, alias = "goamd64")]
    pub amd64: String,

    #[serde(rename = "type")]
    pub kind: ArtifactKind,

    #[serde(default)]
    pub extra: ArtifactExtra,
}

impl Artifact {
    /// Create an artifact without platform information
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            os: String::new(),
            arch: String::new(),
            arm: String::new(),
            amd64: String::new(),
            kind,
            extra: ArtifactExtra::default(),
        }
    }

    /// Whether the artifact is uploaded with the release
    pub fn is_uploadable(&self) -> bool {
        matches!(
            self.kind,
            ArtifactKind::UploadableArchive | ArtifactKind::UploadableBinary
        )
    }

    /// Owning package identifier
    pub fn id(&self) -> &str {
        &self.extra.id
    }

    /// Parsed archive format; bare binaries without a format are [`ArchiveFormat::Binary`]
    pub fn format(&self) -> Option<ArchiveFormat> {
        if self.kind == ArtifactKind::UploadableBinary && self.extra.format.is_empty() {
            return Some(ArchiveFormat::Binary);
        }
        self.extra.format.parse().ok()
    }

    /// Platform described by the artifact, `None` if outside the matrix
    pub fn target(&self) -> Option<Target> {
        Target::parse(&self.os, &self.arch, &self.arm, &self.amd64)
    }

    pub fn selection(&self) -> Selection {
        if self.arch == UNIVERSAL_ARCH {
            Selection::Universal
        } else {
            Selection::PerArch {
                replaces_universal: self.extra.replaces.unwrap_or(false),
            }
        }
    }

    /// Directory the archive unpacks its binaries into, `.` when unwrapped
    pub fn wrapped_in(&self) -> &str {
        if self.extra.wrapped_in.is_empty() {
            "."
        } else {
            &self.extra.wrapped_in
        }
    }
}

/// Ordered collection of artifacts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactList(Vec<Artifact>);

impl ArtifactList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an artifact list from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the artifact list as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn add(&mut self, artifact: Artifact) {
        self.0.push(artifact);
    }

    /// Add `artifact`, dropping earlier entries of the same kind and id
    pub fn replace(&mut self, artifact: Artifact) {
        self.0
            .retain(|a| !(a.kind == artifact.kind && a.extra.id == artifact.extra.id));
        self.0.push(artifact);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.0.iter()
    }

    pub fn by_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.0.iter().filter(move |a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Artifact> for ArtifactList {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ArtifactList {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Os, PlatformKey};

    const CAPITALIZED_JSON: &str = r#"[
  {
    "name": "foo_linux_amd64v1.tar.gz",
    "path": "dist/foo_linux_amd64v1.tar.gz",
    "goos": "linux",
    "goarch": "amd64",
    "goamd64": "v1",
    "internal_type": 1,
    "type": "Archive",
    "extra": {
      "Binaries": ["foo"],
      "Checksum": "sha256:abc",
      "Format": "tgz",
      "ID": "default",
      "Replaces": true,
      "WrappedIn": "foo_1.0.0"
    }
  },
  {
    "name": "checksums.txt",
    "path": "dist/checksums.txt",
    "internal_type": 12,
    "type": "Checksum"
  }
]"#;

    #[test]
    fn test_load_capitalized_keys() {
        let list: ArtifactList = serde_json::from_str(CAPITALIZED_JSON).unwrap();
        assert_eq!(list.len(), 2);

        let archive = list.iter().next().unwrap();
        assert_eq!(archive.kind, ArtifactKind::UploadableArchive);
        assert_eq!(archive.id(), "default");
        assert_eq!(archive.format(), Some(ArchiveFormat::TarGz));
        assert_eq!(archive.extra.binaries, vec!["foo".to_string()]);
        assert_eq!(archive.wrapped_in(), "foo_1.0.0");
        assert_eq!(
            archive.selection(),
            Selection::PerArch {
                replaces_universal: true
            }
        );
        assert_eq!(
            archive.target(),
            Some(Target::Platform(PlatformKey::amd64(Os::Linux, "v1")))
        );

        let other = list.iter().nth(1).unwrap();
        assert_eq!(other.kind, ArtifactKind::Other);
        assert!(!other.is_uploadable());
    }

    #[test]
    fn test_format_aliases() {
        assert_eq!("txz".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarXz);
        assert_eq!("tzst".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarZst);
        assert_eq!("tar".parse::<ArchiveFormat>().unwrap().family(), ArchiveFamily::Tar);
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap().family(), ArchiveFamily::Zip);
        assert!("rar".parse::<ArchiveFormat>().is_err());
    }

    #[test]
    fn test_bare_binary_format() {
        let bin = Artifact::new("foo", "dist/foo", ArtifactKind::UploadableBinary);
        assert_eq!(bin.format(), Some(ArchiveFormat::Binary));
        assert_eq!(bin.wrapped_in(), ".");
    }

    #[test]
    fn test_universal_selection() {
        let mut art = Artifact::new("foo_darwin_all.tar.gz", "dist/x", ArtifactKind::UploadableArchive);
        art.os = "darwin".to_string();
        art.arch = "all".to_string();
        art.extra.replaces = Some(true);
        assert_eq!(art.selection(), Selection::Universal);
        assert_eq!(art.target(), Some(Target::Universal(Os::Darwin)));
    }

    #[test]
    fn test_replace_same_kind_and_id() {
        let mut list = ArtifactList::new();
        let mut archive = Artifact::new("foo.tar.gz", "dist/foo.tar.gz", ArtifactKind::UploadableArchive);
        archive.extra.id = "foo".to_string();
        list.add(archive);

        for path in ["dist/nix/a.nix", "dist/nix/b.nix"] {
            let mut nixpkg = Artifact::new("default.nix", path, ArtifactKind::NixPackage);
            nixpkg.extra.id = "foo".to_string();
            list.replace(nixpkg);
        }
        let mut other = Artifact::new("default.nix", "dist/nix/c.nix", ArtifactKind::NixPackage);
        other.extra.id = "bar".to_string();
        list.replace(other);

        assert_eq!(list.len(), 3);
        let paths: Vec<_> = list
            .by_kind(ArtifactKind::NixPackage)
            .map(|a| a.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["dist/nix/b.nix", "dist/nix/c.nix"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("artifacts.json");

        let mut list = ArtifactList::new();
        list.add(Artifact::new("default.nix", "dist/nix/pkgs/foo/default.nix", ArtifactKind::NixPackage));
        list.save(&path).unwrap();

        let loaded = ArtifactList::load(&path).unwrap();
        assert_eq!(loaded, list);
        assert_eq!(loaded.by_kind(ArtifactKind::NixPackage).count(), 1);
    }
}
