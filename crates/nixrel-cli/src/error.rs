//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use nixrel_core::CoreError;
use nixrel_engine::TemplateError;
use nixrel_pipe::PipeError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Project file or package settings are invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(nixrel::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A templated field failed to expand
    #[error("Template error in `{field}`")]
    #[diagnostic(code(nixrel::cli::template))]
    Template {
        field: String,
        #[source]
        #[diagnostic_source]
        source: TemplateError,
    },

    /// Archives could not be matched to platforms
    #[error("Resolution error: {message}")]
    #[diagnostic(code(nixrel::cli::resolve))]
    Resolution {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Hashing or repository operation failed
    #[error("Publish error: {message}")]
    #[diagnostic(code(nixrel::cli::publish))]
    Publish {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Several packages failed
    #[error("{} packages failed", .errors.len())]
    #[diagnostic(code(nixrel::cli::multiple))]
    Multiple {
        #[related]
        errors: Vec<CliError>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(nixrel::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Resolution { .. } => exit_codes::RESOLUTION_ERROR,
            CliError::Publish { .. } => exit_codes::PUBLISH_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Multiple { errors } => {
                let mut codes = errors.iter().map(CliError::exit_code);
                match codes.next() {
                    Some(first) if codes.all(|c| c == first) => first,
                    _ => exit_codes::ERROR,
                }
            }
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }
}

impl From<PipeError> for CliError {
    fn from(err: PipeError) -> Self {
        let message = err.to_string();
        match err {
            PipeError::InvalidLicense { .. } => CliError::Config {
                message,
                help: Some("use a lib.licenses attribute name such as `mit` or `asl20`".to_string()),
            },
            PipeError::MissingRepositoryName { .. } => CliError::Config {
                message,
                help: Some("set `repository.name` on the nix package".to_string()),
            },
            PipeError::MissingReleaseRepository { .. } => CliError::Config {
                message,
                help: Some("set `release.github` or give the package a `url_template`".to_string()),
            },
            PipeError::FieldTemplate { field, source } => CliError::Template { field, source },
            PipeError::MultipleArchives { .. } => CliError::Resolution {
                message,
                help: Some("narrow the package `ids` so each platform has a single archive".to_string()),
            },
            PipeError::NoArchivesFound { .. } => CliError::Resolution {
                message,
                help: Some("check the package `ids` and `goamd64` against dist/artifacts.json".to_string()),
            },
            PipeError::HasherUnavailable => CliError::Publish {
                message,
                help: Some("install Nix so that `nix-hash` is on PATH".to_string()),
            },
            PipeError::Hash { .. }
            | PipeError::Repository(_)
            | PipeError::PlaceholderHashLeaked { .. } => CliError::Publish {
                message,
                help: None,
            },
            PipeError::Core(err) => err.into(),
            PipeError::Io(err) => err.into(),
            PipeError::Multiple(errors) => CliError::Multiple {
                errors: errors.into_iter().map(CliError::from).collect(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(err) => err.into(),
            CoreError::ProjectNotFound { .. } => CliError::Config {
                message: err.to_string(),
                help: Some("pass the project file with --config".to_string()),
            },
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err: CliError = PipeError::InvalidLicense {
            license: "mitt".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);

        let err: CliError = PipeError::no_archives("v1", &[]).into();
        assert_eq!(err.exit_code(), exit_codes::RESOLUTION_ERROR);

        let err: CliError = PipeError::HasherUnavailable.into();
        assert_eq!(err.exit_code(), exit_codes::PUBLISH_ERROR);
    }

    #[test]
    fn test_multiple_exit_code() {
        let same: CliError = PipeError::Multiple(vec![
            PipeError::no_archives("v1", &[]),
            PipeError::no_archives("v2", &[]),
        ])
        .into();
        assert_eq!(same.exit_code(), exit_codes::RESOLUTION_ERROR);

        let mixed: CliError = PipeError::Multiple(vec![
            PipeError::no_archives("v1", &[]),
            PipeError::HasherUnavailable,
        ])
        .into();
        assert_eq!(mixed.exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_template_error_keeps_field() {
        let err: CliError = PipeError::FieldTemplate {
            field: "description".to_string(),
            source: TemplateError::simple("undefined value"),
        }
        .into();
        assert_eq!(err.to_string(), "Template error in `description`");
        assert_eq!(err.exit_code(), exit_codes::TEMPLATE_ERROR);
    }
}
