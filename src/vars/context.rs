// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Runtime context
//!
//! A snapshot of substitution values built once per pipeline run. All steps
//! of a run share the same context; only the step name differs, so steps get
//! a shallow copy via [`RuntimeContext::for_step`] rather than aliasing
//! shared mutable state.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use chrono::Utc;
use uuid::Uuid;

/// Substitution values for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    /// Absolute path of the file that triggered the run (empty when manual)
    pub file: String,
    /// Event kind that triggered the run ("WRITE", "CREATE", ...)
    pub event_type: String,
    /// Working directory at the time the run started
    pub cwd: String,
    /// Extension of the changed file, including the dot
    pub extension: String,
    /// Changed file name without its extension
    pub basename: String,
    /// Directory containing the changed file
    pub dirname: String,
    /// Changed file path relative to the working directory
    pub rel_file: String,
    /// Name of the build file driving this pipeline
    pub build_file: String,
    /// Name of the step currently executing
    pub step_name: String,
    /// RFC 3339 timestamp taken when the context was built
    pub timestamp: String,
    /// Fresh identifier for this run
    pub uuid: String,
    /// Operating system, e.g. "linux"
    pub os: String,
    /// CPU architecture, e.g. "x86_64"
    pub arch: String,
    /// Current git branch, empty if unavailable
    pub git_branch: String,
    /// Current git commit hash, empty if unavailable
    pub git_commit: String,
    /// User-defined variables from the build file
    pub user_vars: HashMap<String, String>,
}

impl RuntimeContext {
    /// Build the context for one pipeline run.
    ///
    /// `changed_file` may be empty for manual runs; the derived path fields
    /// are then empty too. Git lookups are best-effort and never fail the
    /// run.
    pub fn build(
        user_vars: HashMap<String, String>,
        build_file: &str,
        changed_file: &str,
        event_type: &str,
    ) -> Self {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let path = Path::new(changed_file);
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dirname = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        // Relative only when the file sits under the CWD; a file outside it
        // keeps its full path rather than getting a `..`-walking one.
        let rel_file = path
            .strip_prefix(&cwd)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| changed_file.to_string());

        Self {
            file: changed_file.to_string(),
            event_type: event_type.to_string(),
            cwd,
            extension,
            basename,
            dirname,
            rel_file,
            build_file: build_file.to_string(),
            step_name: String::new(),
            timestamp: Utc::now().to_rfc3339(),
            uuid: Uuid::new_v4().to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            git_branch: run_git(Path::new("."), &["rev-parse", "--abbrev-ref", "HEAD"]),
            git_commit: run_git(Path::new("."), &["rev-parse", "HEAD"]),
            user_vars,
        }
    }

    /// A shallow per-step copy with only the step name changed.
    pub fn for_step(&self, step_name: &str) -> Self {
        let mut ctx = self.clone();
        ctx.step_name = step_name.to_string();
        ctx
    }

    /// Look up a builtin token by name.
    ///
    /// Returns `None` for names outside the fixed token vocabulary; the
    /// interpolator then falls back to `user_vars`.
    pub fn builtin(&self, name: &str) -> Option<&str> {
        let value = match name {
            "FILE" => &self.file,
            "CWD" => &self.cwd,
            "EVENT_TYPE" => &self.event_type,
            "EXT" => &self.extension,
            "BASENAME" => &self.basename,
            "DIRNAME" => &self.dirname,
            "RELFILE" => &self.rel_file,
            "BUILD_FILE" => &self.build_file,
            "BUILD_STEP" => &self.step_name,
            "TIMESTAMP" => &self.timestamp,
            "UUID" => &self.uuid,
            "OS" => &self.os,
            "ARCH" => &self.arch,
            "GIT_BRANCH" => &self.git_branch,
            "GIT_COMMIT" => &self.git_commit,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// Run a git query in `dir`, returning empty string on any failure.
fn run_git(dir: &Path, args: &[&str]) -> String {
    Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_default()
}
