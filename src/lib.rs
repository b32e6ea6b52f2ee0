// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! # pipewatch - Local Pipeline Runner
//!
//! `pipewatch` executes a declared sequence of shell steps, optionally in
//! parallel groups, gated by runtime conditions, and can re-trigger that
//! pipeline automatically when files change under a watched directory tree.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the pipeline in build.yaml once
//! pipewatch run
//!
//! # Re-run it whenever a file changes
//! pipewatch watch
//! ```
//!
//! Command templates may use `$FILE`, `$EVENT_TYPE`, `$BUILD_STEP`, and the
//! rest of the token vocabulary, plus any variable declared under `vars:`.
//! Steps may carry an `if:` condition with the operators
//! `== != ^= $= *= ~=`.

pub mod cli;
pub mod errors;
pub mod pipeline;
pub mod vars;
pub mod watch;

// Re-export commonly used types
pub use errors::{PipewatchError, PipewatchResult};
pub use pipeline::{ParallelGroup, PipelineConfig, PipelineEngine, PipelineReport, Step};
pub use vars::RuntimeContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
