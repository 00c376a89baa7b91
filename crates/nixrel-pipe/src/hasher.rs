//! Archive hashing
//!
//! Hashes are Nix base32 sha256 digests of the archive file, computed by
//! `nix-hash`. The build phase uses [`HashStrategy::Placeholder`] so it runs
//! without Nix installed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{PipeError, Result};

/// Hash written by the build phase
pub const PLACEHOLDER_HASH: &str = "0000000000000000000000000000000000000000000000000000";

/// Default number of hashes computed at once
pub const DEFAULT_HASH_CONCURRENCY: usize = 4;

/// Computes the content hash of a file
#[async_trait]
pub trait FileHasher: Send + Sync {
    /// Nix base32 sha256 of the file at `path`
    async fn hash(&self, path: &Path) -> Result<String>;

    /// Whether the hasher can run on this machine
    fn available(&self) -> bool;
}

/// Hashes files with `nix-hash --type sha256 --flat --base32`
#[derive(Debug, Clone)]
pub struct NixHasher {
    binary: String,
}

impl Default for NixHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl NixHasher {
    pub fn new() -> Self {
        Self::with_binary("nix-hash")
    }

    /// Use another executable name or path
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl FileHasher for NixHasher {
    async fn hash(&self, path: &Path) -> Result<String> {
        let hash_error = |message: String| PipeError::Hash {
            path: path.display().to_string(),
            message,
        };

        let output = tokio::process::Command::new(&self.binary)
            .args(["--type", "sha256", "--flat", "--base32"])
            .arg(path)
            .output()
            .await
            .map_err(|e| hash_error(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(hash_error(stderr.trim().to_string()));
        }

        let digest = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if digest.is_empty() {
            return Err(hash_error(format!("{} printed no hash", self.binary)));
        }
        Ok(digest)
    }

    fn available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }
}

/// Where manifest hashes come from
#[derive(Clone, Copy)]
pub enum HashStrategy<'a> {
    /// Every archive gets [`PLACEHOLDER_HASH`]
    Placeholder,
    /// Hashes are computed by the given hasher
    Real(&'a dyn FileHasher),
}

impl HashStrategy<'_> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, HashStrategy::Placeholder)
    }

    /// Hash every distinct path, at most `concurrency` at a time
    pub async fn hash_all<'p>(
        &self,
        paths: impl IntoIterator<Item = &'p Path>,
        concurrency: usize,
    ) -> Result<HashMap<PathBuf, String>> {
        let mut unique: Vec<PathBuf> = Vec::new();
        for path in paths {
            if !unique.iter().any(|p| p == path) {
                unique.push(path.to_path_buf());
            }
        }

        match self {
            HashStrategy::Placeholder => Ok(unique
                .into_iter()
                .map(|p| (p, PLACEHOLDER_HASH.to_string()))
                .collect()),
            HashStrategy::Real(hasher) => {
                stream::iter(unique)
                    .map(|path| async move {
                        tracing::debug!(path = %path.display(), "hashing archive");
                        let digest = hasher.hash(&path).await?;
                        Ok::<_, PipeError>((path, digest))
                    })
                    .buffered(concurrency.max(1))
                    .try_collect()
                    .await
            }
        }
    }
}
