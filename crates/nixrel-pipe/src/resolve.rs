//! Archive resolution
//!
//! Maps the uploadable artifacts of a release onto the platform matrix so that
//! every platform with a contributing artifact gets exactly one archive.
//!
//! Universal binaries (`arch: all`) stand in for every architecture of their
//! OS. A per-arch artifact flagged with `replaces` wins over the universal
//! binary for its own platform only.

use std::collections::BTreeMap;

use nixrel_core::{
    Arch, ArchiveFormat, Artifact, ArtifactList, Os, PlatformKey, Selection, Target,
};

use crate::error::{PipeError, Result};

/// The archive chosen for one platform
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArchive<'a> {
    pub platform: PlatformKey,
    pub artifact: &'a Artifact,
    pub format: ArchiveFormat,
}

/// An artifact that survived filtering
#[derive(Clone, Copy)]
struct Candidate<'a> {
    artifact: &'a Artifact,
    format: ArchiveFormat,
}

#[derive(Default)]
struct Slot<'a> {
    regular: Vec<Candidate<'a>>,
    replacing: Vec<Candidate<'a>>,
}

/// Select one archive per platform
///
/// `ids` restricts the artifacts to those packages (empty keeps all);
/// `goamd64` is the amd64 micro-architecture level to package. The result is
/// ordered by platform key.
pub fn resolve<'a>(
    artifacts: &'a ArtifactList,
    ids: &[String],
    goamd64: &str,
) -> Result<Vec<ResolvedArchive<'a>>> {
    let mut universals: BTreeMap<Os, Vec<Candidate<'a>>> = BTreeMap::new();
    let mut slots: BTreeMap<PlatformKey, Slot<'a>> = BTreeMap::new();

    for artifact in artifacts {
        if !artifact.is_uploadable() {
            continue;
        }
        if !ids.is_empty() && !ids.iter().any(|id| id == artifact.id()) {
            continue;
        }
        let Some(format) = artifact.format() else {
            tracing::debug!(name = %artifact.name, format = %artifact.extra.format, "skipping artifact with unknown format");
            continue;
        };
        let Some(target) = artifact.target() else {
            tracing::debug!(name = %artifact.name, "skipping artifact outside the platform matrix");
            continue;
        };

        let candidate = Candidate { artifact, format };
        match (target, artifact.selection()) {
            (Target::Universal(os), _) => universals.entry(os).or_default().push(candidate),
            (Target::Platform(key), Selection::PerArch { replaces_universal }) => {
                if key.amd64.as_deref().is_some_and(|v| v != goamd64) {
                    continue;
                }
                let slot = slots.entry(key).or_default();
                if replaces_universal {
                    slot.replacing.push(candidate);
                } else {
                    slot.regular.push(candidate);
                }
            }
            (Target::Platform(_), Selection::Universal) => continue,
        }
    }

    let mut universal_by_os: BTreeMap<Os, Candidate<'a>> = BTreeMap::new();
    for (os, candidates) in universals {
        let candidate = single(&format!("{}/all", os), candidates)?;
        universal_by_os.insert(os, candidate);
        // A universal binary covers these even without per-arch archives.
        for arch in Arch::UNIVERSAL {
            if let Some(key) = PlatformKey::for_arch(os, arch, goamd64) {
                slots.entry(key).or_default();
            }
        }
    }

    let mut resolved = Vec::with_capacity(slots.len());
    for (key, slot) in slots {
        let replacing = optional(&key, slot.replacing)?;
        let regular = optional(&key, slot.regular)?;

        let chosen = replacing
            .or_else(|| universal_by_os.get(&key.os).copied())
            .or(regular);

        if let Some(candidate) = chosen {
            tracing::debug!(platform = %key, archive = %candidate.artifact.name, "resolved archive");
            resolved.push(ResolvedArchive {
                platform: key,
                artifact: candidate.artifact,
                format: candidate.format,
            });
        }
    }

    if resolved.is_empty() {
        return Err(PipeError::no_archives(goamd64, ids));
    }
    Ok(resolved)
}

/// At most one candidate, or a multiple-archives error
fn optional<'a>(key: &PlatformKey, candidates: Vec<Candidate<'a>>) -> Result<Option<Candidate<'a>>> {
    if candidates.is_empty() {
        return Ok(None);
    }
    single(&key.to_string(), candidates).map(Some)
}

fn single<'a>(platform: &str, candidates: Vec<Candidate<'a>>) -> Result<Candidate<'a>> {
    match candidates.as_slice() {
        [only] => Ok(*only),
        _ => {
            let mut formats: Vec<String> = candidates.iter().map(|c| c.format.to_string()).collect();
            formats.sort();
            Err(PipeError::MultipleArchives {
                platform: platform.to_string(),
                formats,
            })
        }
    }
}
