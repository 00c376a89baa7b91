//! Templated package fields
//!
//! Every field is expanded on its own so a failure names the field it came
//! from. Fields are evaluated in order and expansion stops at the first error.

use nixrel_core::{NixPackage, ReleaseContext};
use nixrel_engine::{Engine, EngineError, TemplateError};
use serde::Serialize;

use crate::error::{PipeError, Result};

/// Expand a single field
pub fn expand<S: Serialize>(engine: &Engine, ctx: &S, field: &str, source: &str) -> Result<String> {
    if !source.contains("{{") && !source.contains("{%") {
        return Ok(source.to_string());
    }

    engine
        .render_string(source, ctx, field)
        .map_err(|err| field_error(field, err))
}

/// Attach the field name to an engine error
pub(crate) fn field_error(field: &str, err: EngineError) -> PipeError {
    PipeError::FieldTemplate {
        field: field.to_string(),
        source: match err {
            EngineError::Template(e) => e,
            EngineError::Context(e) => TemplateError::simple(e.to_string()),
        },
    }
}

/// Expand `(field, source)` pairs in order, stopping at the first failure
pub fn expand_all<S: Serialize>(
    engine: &Engine,
    ctx: &S,
    fields: &[(&str, &str)],
) -> Result<Vec<String>> {
    fields
        .iter()
        .map(|(field, source)| expand(engine, ctx, field, source))
        .collect()
}

/// Package fields expanded during the build phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageFields {
    pub name: String,
    pub skip_upload: String,
    pub homepage: String,
    pub description: String,
    pub path: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub repo_branch: String,
    pub repo_token: String,
    pub base_owner: String,
    pub base_name: String,
    pub base_branch: String,
}

impl PackageFields {
    /// Expand the run-phase fields of `pkg`
    ///
    /// `pkg` must already have its defaults applied.
    pub fn expand(engine: &Engine, ctx: &ReleaseContext, pkg: &NixPackage) -> Result<Self> {
        let repo = &pkg.repository;
        let base = &repo.pull_request.base;

        let values = expand_all(
            engine,
            ctx,
            &[
                ("name", pkg.name.as_str()),
                ("skip_upload", pkg.skip_upload.as_str()),
                ("homepage", pkg.homepage.as_str()),
                ("description", pkg.description.as_str()),
                ("path", pkg.path.as_str()),
                ("repository.owner", repo.owner.as_str()),
                ("repository.name", repo.name.as_str()),
                ("repository.branch", repo.branch.as_str()),
                ("repository.token", repo.token.as_str()),
                ("pull_request.base.owner", base.owner.as_str()),
                ("pull_request.base.name", base.name.as_str()),
                ("pull_request.base.branch", base.branch.as_str()),
            ],
        )?;

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let mut fields = Self {
            name: next(),
            skip_upload: next(),
            homepage: next(),
            description: next(),
            path: next(),
            repo_owner: next(),
            repo_name: next(),
            repo_branch: next(),
            repo_token: next(),
            base_owner: next(),
            base_name: next(),
            base_branch: next(),
        };

        if fields.path.is_empty() {
            fields.path = default_path(&fields.name);
        }
        Ok(fields)
    }
}

/// `pkgs/<name>/default.nix`
pub fn default_path(name: &str) -> String {
    format!("pkgs/{}/default.nix", name)
}
