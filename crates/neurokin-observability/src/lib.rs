// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurokin-observability
//!
//! Logging setup shared by the neurokin tools, with per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: per-run log folders written through `tracing-appender`

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Workspace crate names accepted by `--debug-<crate>`
pub const KNOWN_CRATES: &[&str] = &[
    "neurokin",
    "neurokin-model",
    "neurokin-serialization",
    "neurokin-config",
    "neurokin-observability",
];
