//! nixrel Engine - MiniJinja templating for release fields
//!
//! This crate provides the template capability used by the Nix packaging step:
//! - Strict expansion of single template strings against a serializable context
//! - Nix-aware filters (`nix_escape`, `quote`, ...)
//! - Human-readable error messages with source spans and suggestions

pub mod engine;
pub mod error;
pub mod filters;
pub mod suggestions;

pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use suggestions::AVAILABLE_FILTERS;
