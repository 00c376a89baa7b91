//! nixrel Pipe - the Nix packaging step
//!
//! Turns the per-platform archives of a release into a Nix derivation:
//! - `resolve`: one archive per platform, with universal binary overrides
//! - `install`: install script fragments per archive family
//! - `manifest`: renders `package.nix` from resolved archives and hashes
//! - `pipe`: the build phase (placeholder hashes) and publish phase

pub mod error;
pub mod fields;
pub mod hasher;
pub mod install;
pub mod manifest;
pub mod pipe;
pub mod resolve;

pub use error::{PipeError, Result};
pub use fields::PackageFields;
pub use hasher::{DEFAULT_HASH_CONCURRENCY, FileHasher, HashStrategy, NixHasher, PLACEHOLDER_HASH};
pub use install::{InstallFragment, compose};
pub use manifest::{DEFAULT_URL_TEMPLATE, RenderRequest};
pub use pipe::{
    BuiltPackage, DEFAULT_COMMIT_MSG_TEMPLATE, DEFAULT_GOAMD64, PackageReport, PublishOutcome,
    PublishSummary, Publisher, SkipReason, build_all, defaults, skip_reason,
};
pub use resolve::{ResolvedArchive, resolve};
