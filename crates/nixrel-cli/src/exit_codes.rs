//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - invalid nixrel.yaml or package settings
pub const CONFIG_ERROR: i32 = 2;

/// Template error - a templated field failed to expand
pub const TEMPLATE_ERROR: i32 = 3;

/// Resolution error - archives could not be matched to platforms
pub const RESOLUTION_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Publish error - hashing or repository operations failed
pub const PUBLISH_ERROR: i32 = 6;
