//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Project file not found: {path}")]
    ProjectNotFound { path: String },

    #[error("Invalid project file: {message}")]
    InvalidProject { message: String },

    #[error("Failed to parse project file: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse artifact list: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Unknown archive format: {format}")]
    UnknownFormat { format: String },

    #[error("Unknown platform component: {value}")]
    UnknownPlatform { value: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
