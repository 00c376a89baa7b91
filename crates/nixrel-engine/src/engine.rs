//! Template engine based on MiniJinja

use minijinja::Environment;
use serde::Serialize;

use crate::error::{EngineError, Result, TemplateError};
use crate::filters;

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
    keep_trailing_newline: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: true,
            keep_trailing_newline: true,
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Keep the final newline of rendered templates
    pub fn keep_trailing_newline(mut self, keep: bool) -> Self {
        self.keep_trailing_newline = keep;
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        Engine {
            strict_mode: self.strict_mode,
            keep_trailing_newline: self.keep_trailing_newline,
        }
    }
}

/// The template engine
///
/// Renders both one-line release fields (`{{ project_name }}-bin`) and whole
/// manifest templates. Undefined variables are errors by default.
pub struct Engine {
    strict_mode: bool,
    keep_trailing_newline: bool,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::new().build()
    }
}

impl Engine {
    /// Create a new engine
    pub fn new(strict_mode: bool) -> Self {
        EngineBuilder::new().strict(strict_mode).build()
    }

    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(self.keep_trailing_newline);

        env.add_filter("nix_escape", filters::nix_escape);
        env.add_filter("quote", filters::quote);
        env.add_filter("required", filters::required);
        env.add_filter("trimprefix", filters::trimprefix);
        env.add_filter("trimsuffix", filters::trimsuffix);
        env.add_filter("tolower", filters::tolower);
        env.add_filter("toupper", filters::toupper);

        env
    }

    /// Render a single template string against a serializable context
    ///
    /// `template_name` is used in diagnostics, e.g. the name of the field
    /// being expanded.
    pub fn render_string<S: Serialize>(
        &self,
        template: &str,
        context: &S,
        template_name: &str,
    ) -> Result<String> {
        let json = serde_json::to_value(context)?;
        let mut env = self.create_environment();

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(|e| {
                EngineError::Template(TemplateError::from_minijinja(
                    e,
                    template_name,
                    template,
                    Some(&json),
                ))
            })?;

        let tmpl = env.get_template(template_name).map_err(|e| {
            EngineError::Template(TemplateError::from_minijinja(
                e,
                template_name,
                template,
                Some(&json),
            ))
        })?;

        tmpl.render(minijinja::Value::from_serialize(&json))
            .map_err(|e| {
                EngineError::Template(TemplateError::from_minijinja(
                    e,
                    template_name,
                    template,
                    Some(&json),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;
    use serde_json::json;

    #[test]
    fn test_render_simple() {
        let engine = Engine::default();
        let ctx = json!({ "project_name": "foo", "version": "1.2.1" });

        let result = engine
            .render_string("{{ project_name }}-{{ version }}", &ctx, "name")
            .unwrap();
        assert_eq!(result, "foo-1.2.1");
    }

    #[test]
    fn test_render_nested_env() {
        let engine = Engine::default();
        let ctx = json!({ "env": { "NUR_TOKEN": "secret" } });

        let result = engine
            .render_string("{{ env.NUR_TOKEN }}", &ctx, "repository.token")
            .unwrap();
        assert_eq!(result, "secret");
    }

    #[test]
    fn test_render_with_filters() {
        let engine = Engine::default();
        let ctx = json!({ "tag": "v1.0.0", "description": "say \"hi\"" });

        let result = engine
            .render_string("{{ tag | trimprefix('v') }} {{ description | nix_escape }}", &ctx, "t")
            .unwrap();
        assert_eq!(result, "1.0.0 say \\\"hi\\\"");
    }

    #[test]
    fn test_strict_mode_undefined_error() {
        let engine = Engine::default();
        let ctx = json!({ "version": "1.0.0" });

        let err = engine
            .render_string("{{ verison }}", &ctx, "description")
            .unwrap_err();

        match err {
            EngineError::Template(e) => {
                assert_eq!(e.kind(), TemplateErrorKind::UndefinedVariable);
                let help = e.suggestion.unwrap_or_default();
                assert!(help.contains("version"), "help: {}", help);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_release_context() {
        use nixrel_core::{Artifact, ArtifactKind, ReleaseContext};

        let mut artifact = Artifact::new(
            "foo_linux_amd64.tar.gz",
            "dist/foo_linux_amd64.tar.gz",
            ArtifactKind::UploadableArchive,
        );
        artifact.os = "linux".to_string();
        artifact.arch = "amd64".to_string();

        let ctx = ReleaseContext::new("foo", "v1.2.1")
            .unwrap()
            .with_release_url("https://dl.example.com/v1.2.1");
        let ctx = ctx.with_artifact(&artifact);

        let result = Engine::default()
            .render_string("{{ release_url }}/{{ artifact_name }}", &ctx, "url_template")
            .unwrap();
        assert_eq!(result, "https://dl.example.com/v1.2.1/foo_linux_amd64.tar.gz");
    }

    #[test]
    fn test_lenient_mode() {
        let engine = Engine::new(false);
        let ctx = json!({});

        let result = engine.render_string("[{{ missing }}]", &ctx, "t").unwrap();
        assert_eq!(result, "[]");
    }

    #[test]
    fn test_syntax_error() {
        let engine = Engine::default();
        let ctx = json!({});

        let err = engine
            .render_string("{{ .Version }}", &ctx, "name")
            .unwrap_err();
        match err {
            EngineError::Template(e) => assert_eq!(e.kind(), TemplateErrorKind::SyntaxError),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_block_whitespace_control() {
        let engine = Engine::default();
        let ctx = json!({ "items": ["a", "b"] });

        let result = engine
            .render_string("{% for i in items %}\n  {{ i }}\n{% endfor %}\n", &ctx, "list")
            .unwrap();
        assert_eq!(result, "  a\n  b\n");
    }
}
