// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Error types
//!
//! Step failures are the only errors that cross the pipeline boundary;
//! everything else is absorbed close to where it happens.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipewatch operations
pub type PipewatchResult<T> = Result<T, PipewatchError>;

/// Main error type for pipewatch
#[derive(Error, Debug, Diagnostic)]
pub enum PipewatchError {
    // ─────────────────────────────────────────────────────────────────────────
    // Step Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Step '{step}' failed: '{command}' exited with code {code}")]
    #[diagnostic(
        code(pipewatch::step_failed),
        help("The pipeline stops at the first failing step. Fix the command or gate it with an 'if' condition.")
    )]
    StepFailed {
        step: String,
        command: String,
        code: i32,
    },

    #[error("Step '{step}' could not start: {error}")]
    #[diagnostic(
        code(pipewatch::step_spawn_failed),
        help("Check that the shell and the command binary are on PATH")
    )]
    StepSpawnFailed {
        step: String,
        command: String,
        error: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Build file not found: {path}")]
    #[diagnostic(
        code(pipewatch::build_file_not_found),
        help("Create a build.yaml in the project root or pass one with --file")
    )]
    BuildFileNotFound { path: PathBuf },

    #[error("Failed to read build file '{path}': {error}")]
    #[diagnostic(code(pipewatch::build_file_read_error))]
    BuildFileReadError { path: PathBuf, error: String },

    #[error("Failed to load inherited build file '{path}': {error}")]
    #[diagnostic(
        code(pipewatch::inherit_error),
        help("'inherit' paths are resolved relative to the file that declares them")
    )]
    InheritError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Watch Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to initialize the file watcher: {message}")]
    #[diagnostic(code(pipewatch::watch_init_failed))]
    WatchInitFailed { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(pipewatch::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(pipewatch::yaml_error))]
    Yaml { message: String },
}

impl From<std::io::Error> for PipewatchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for PipewatchError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<notify::Error> for PipewatchError {
    fn from(e: notify::Error) -> Self {
        Self::WatchInitFailed { message: e.to_string() }
    }
}
