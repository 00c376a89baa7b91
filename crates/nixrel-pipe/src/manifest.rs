//! Nix manifest rendering
//!
//! The manifest is rendered from `templates/package.nix.j2`. Everything fed to
//! the template is computed here in a fixed order, so rendering the same input
//! twice gives byte-identical output.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use indexmap::IndexSet;
use nixrel_core::{ArchiveFamily, NixPackage, ReleaseContext};
use nixrel_engine::Engine;
use serde::Serialize;

use crate::error::{PipeError, Result};
use crate::fields::{self, PackageFields};
use crate::install::InstallFragment;
use crate::resolve::ResolvedArchive;

/// Template the manifest is rendered from
pub const MANIFEST_TEMPLATE: &str = include_str!("templates/package.nix.j2");

const MANIFEST_TEMPLATE_NAME: &str = "package.nix.j2";

/// Formals every manifest declares; dependencies never repeat them
const FIXED_ARGS: [&str; 5] = ["system", "lib", "fetchurl", "installShellFiles", "stdenvNoCC"];

/// URL used when a package sets no `url_template`
pub const DEFAULT_URL_TEMPLATE: &str = "{{ release_url }}/{{ artifact_name }}";

/// Everything needed to render one package
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub package: &'a NixPackage,
    pub fields: &'a PackageFields,
    pub archives: &'a [ResolvedArchive<'a>],
    pub hashes: &'a HashMap<PathBuf, String>,
    pub fragments: &'a [InstallFragment],
}

#[derive(Debug, Serialize)]
struct ManifestData {
    name: String,
    version: String,
    args: Vec<String>,
    native_inputs: Vec<String>,
    archives: Vec<ArchiveEntry>,
    format_map: bool,
    all_binary: bool,
    some_binary: bool,
    install: Vec<String>,
    install_map: Vec<FamilyInstall>,
    post_install: Vec<String>,
    description: String,
    homepage: String,
    license: String,
    platforms: Vec<String>,
}

/// One row of the per-system maps
#[derive(Debug, Serialize)]
struct ArchiveEntry {
    system: String,
    url: String,
    sha256: String,
    source_root: String,
    family: &'static str,
}

#[derive(Debug, Serialize)]
struct FamilyInstall {
    family: &'static str,
    lines: Vec<String>,
}

/// Render the manifest of one package
pub fn render(engine: &Engine, ctx: &ReleaseContext, req: &RenderRequest<'_>) -> Result<String> {
    let pkg = req.package;
    let archives = archive_entries(engine, ctx, req)?;

    let families: BTreeSet<ArchiveFamily> = req.archives.iter().map(|a| a.format.family()).collect();
    let has_zip = families.contains(&ArchiveFamily::Zip);
    let has_deps = !pkg.dependencies.is_empty();

    let mut formals: IndexSet<&str> = FIXED_ARGS.into_iter().collect();
    let mut native_inputs = vec!["installShellFiles".to_string()];
    if has_deps {
        formals.insert("makeWrapper");
        native_inputs.push("makeWrapper".to_string());
    }
    if has_zip {
        formals.insert("unzip");
        native_inputs.push("unzip".to_string());
    }
    formals.extend(pkg.dependencies.iter().map(|d| d.name.as_str()));
    let args = formals
        .into_iter()
        .skip(FIXED_ARGS.len())
        .map(str::to_string)
        .collect();

    let custom_install = fields::expand(engine, ctx, "install", &pkg.install)?;
    let extra_install = split_lines(&fields::expand(engine, ctx, "extra_install", &pkg.extra_install)?);
    let post_install = split_lines(&fields::expand(engine, ctx, "post_install", &pkg.post_install)?);

    let (install, install_map) = if !custom_install.trim().is_empty() {
        let mut lines = split_lines(&custom_install);
        lines.extend(extra_install);
        (lines, Vec::new())
    } else {
        let binaries = binaries(req);
        let mut by_family: Vec<FamilyInstall> = families
            .iter()
            .map(|family| FamilyInstall {
                family: family.as_str(),
                lines: family_install(req.fragments, *family, &binaries, &extra_install),
            })
            .collect();

        if by_family.len() == 1 {
            (by_family.remove(0).lines, Vec::new())
        } else {
            (Vec::new(), by_family)
        }
    };

    let platforms = archives.iter().map(|a| a.system.clone()).collect();
    let data = ManifestData {
        name: req.fields.name.clone(),
        version: ctx.version.clone(),
        args,
        native_inputs,
        format_map: families.len() > 1,
        all_binary: families.len() == 1 && families.contains(&ArchiveFamily::Binary),
        some_binary: families.contains(&ArchiveFamily::Binary),
        archives,
        install,
        install_map,
        post_install,
        description: req.fields.description.clone(),
        homepage: req.fields.homepage.clone(),
        license: pkg.license.clone(),
        platforms,
    };

    engine
        .render_string(MANIFEST_TEMPLATE, &data, MANIFEST_TEMPLATE_NAME)
        .map_err(|err| fields::field_error("manifest", err))
}

fn archive_entries(
    engine: &Engine,
    ctx: &ReleaseContext,
    req: &RenderRequest<'_>,
) -> Result<Vec<ArchiveEntry>> {
    let url_template = if req.package.url_template.is_empty() {
        DEFAULT_URL_TEMPLATE
    } else {
        req.package.url_template.as_str()
    };

    let mut entries = Vec::with_capacity(req.archives.len());
    for archive in req.archives {
        let artifact = archive.artifact;
        let url = fields::expand(engine, &ctx.with_artifact(artifact), "url_template", url_template)?;
        let sha256 = req
            .hashes
            .get(&artifact.path)
            .cloned()
            .ok_or_else(|| PipeError::Hash {
                path: artifact.path.display().to_string(),
                message: "no hash computed for archive".to_string(),
            })?;

        entries.push(ArchiveEntry {
            system: archive.platform.nix_system(),
            url,
            sha256,
            source_root: artifact.wrapped_in().to_string(),
            family: archive.format.family().as_str(),
        });
    }

    entries.sort_by(|a, b| a.system.cmp(&b.system));
    Ok(entries)
}

/// Binaries shipped by the resolved archives, in first-seen order
fn binaries(req: &RenderRequest<'_>) -> Vec<String> {
    let found: IndexSet<&str> = req
        .archives
        .iter()
        .flat_map(|a| a.artifact.extra.binaries.iter().map(String::as_str))
        .collect();

    if found.is_empty() {
        tracing::warn!(
            package = %req.fields.name,
            "archives list no binaries, guessing install script from the package name"
        );
        return vec![req.fields.name.clone()];
    }
    found.into_iter().map(str::to_string).collect()
}

fn family_install(
    fragments: &[InstallFragment],
    family: ArchiveFamily,
    binaries: &[String],
    extra_install: &[String],
) -> Vec<String> {
    let mut lines = vec!["mkdir -p $out/bin".to_string()];
    if let Some(fragment) = fragments.iter().find(|f| f.family == family) {
        for bin in binaries {
            lines.extend(fragment.expand(bin));
        }
    }
    lines.extend(extra_install.iter().cloned());
    lines
}

/// Non-blank lines of a script, trimmed
pub fn split_lines(script: &str) -> Vec<String> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
