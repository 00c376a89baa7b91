//! Errors of the Nix packaging step

use std::collections::BTreeSet;

use nixrel_core::{Arch, ArmVariant, CoreError, Os};
use nixrel_engine::TemplateError;
use nixrel_repo::RepoError;
use thiserror::Error;

/// Packaging errors, grouped by the phase that raises them
#[derive(Debug, Error)]
pub enum PipeError {
    // ============ Configuration Errors ============
    #[error("invalid license `{license}`: must be empty or a lib.licenses attribute name")]
    InvalidLicense { license: String },

    #[error("package `{package}` has no repository name")]
    MissingRepositoryName { package: String },

    #[error("package `{package}` uses the default url_template but release.github is not set")]
    MissingReleaseRepository { package: String },

    // ============ Resolution Errors ============
    #[error("one package can handle only one archive per platform: {platform} has {}", .formats.join(", "))]
    MultipleArchives {
        platform: String,
        formats: Vec<String>,
    },

    #[error("no archives found matching {}", matrix_description(.goamd64, .ids))]
    NoArchivesFound { goamd64: String, ids: Vec<String> },

    // ============ Template Errors ============
    #[error("failed to expand field `{field}`: {source}")]
    FieldTemplate {
        field: String,
        #[source]
        source: TemplateError,
    },

    // ============ Capability Errors ============
    #[error("nix-hash is not available, cannot compute archive hashes")]
    HasherUnavailable,

    #[error("failed to hash {path}: {message}")]
    Hash { path: String, message: String },

    #[error("repository error: {0}")]
    Repository(#[from] RepoError),

    // ============ Other ============
    #[error("generated manifest for `{package}` still contains the placeholder hash")]
    PlaceholderHashLeaked { package: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} packages failed:\n{}", .0.len(), format_failures(.0))]
    Multiple(Vec<PipeError>),
}

impl PipeError {
    /// Build a no-archives error; ids are deduplicated and sorted
    pub fn no_archives(goamd64: &str, ids: &[String]) -> Self {
        let ids: BTreeSet<&String> = ids.iter().collect();
        PipeError::NoArchivesFound {
            goamd64: goamd64.to_string(),
            ids: ids.into_iter().cloned().collect(),
        }
    }

    /// Whether this is a configuration error raised before any artifact scan
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipeError::InvalidLicense { .. }
                | PipeError::MissingRepositoryName { .. }
                | PipeError::MissingReleaseRepository { .. }
        )
    }
}

/// `goos=[..] goarch=[..] goarm=[..] goamd64=.. ids=[..]`
fn matrix_description(goamd64: &str, ids: &[String]) -> String {
    let goos: BTreeSet<Os> = Os::ALL.into_iter().collect();
    let goarch: BTreeSet<Arch> = Arch::ALL.into_iter().collect();
    let goarm: BTreeSet<ArmVariant> = ArmVariant::ALL.into_iter().collect();
    let ids: BTreeSet<&str> = ids.iter().map(String::as_str).collect();

    format!(
        "goos=[{}] goarch=[{}] goarm=[{}] goamd64={} ids=[{}]",
        join(goos.iter().map(Os::as_str)),
        join(goarch.iter().map(Arch::as_str)),
        join(goarm.iter().map(ArmVariant::as_str)),
        goamd64,
        join(ids.into_iter()),
    )
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(" ")
}

fn format_failures(errors: &[PipeError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for packaging operations
pub type Result<T> = std::result::Result<T, PipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_archives_message() {
        let err = PipeError::no_archives("v2", &["nopenopenope".to_string()]);
        assert_eq!(
            err.to_string(),
            "no archives found matching goos=[darwin linux windows] goarch=[amd64 arm arm64 386] goarm=[6 7] goamd64=v2 ids=[nopenopenope]"
        );
    }

    #[test]
    fn test_no_archives_ids_sorted() {
        let err = PipeError::no_archives("v1", &["foo".to_string(), "bar".to_string(), "foo".to_string()]);
        assert!(err.to_string().ends_with("goamd64=v1 ids=[bar foo]"));
    }

    #[test]
    fn test_multiple_archives_message() {
        let err = PipeError::MultipleArchives {
            platform: "linux/arm64".to_string(),
            formats: vec!["tar.gz".to_string(), "zip".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "one package can handle only one archive per platform: linux/arm64 has tar.gz, zip"
        );
    }

    #[test]
    fn test_multiple_failures() {
        let err = PipeError::Multiple(vec![
            PipeError::HasherUnavailable,
            PipeError::PlaceholderHashLeaked {
                package: "foo".to_string(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 packages failed:"));
        assert!(msg.contains("  - nix-hash is not available"));
    }
}
