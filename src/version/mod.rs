//! Build identity.
//!
//! Every build is stamped with a pronounceable name derived from its build time, so two
//! binaries built minutes apart can be told apart in logs and in `--version` output.

pub mod phonetic;

pub use phonetic::phonetic_name;

/// Name of this build, computed by `build.rs`.
pub const BUILD_NAME: &str = env!("BUILD_NAME");

pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_NAME"), ")");
