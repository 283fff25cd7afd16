//! Relink binaries
//!
//! Shared CLI plumbing for the executables under `src/bin/`.

pub mod common;
