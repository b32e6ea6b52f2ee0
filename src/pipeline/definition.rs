// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Pipeline definition structures
//!
//! Defines the schema for build.yaml files and the ignore predicate used by
//! the watch loop.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::PipewatchError;

/// Pipeline definition from build.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base build file to merge into this one
    #[serde(default)]
    pub inherit: Option<String>,

    /// Config version (for future compatibility)
    #[serde(default, rename = "version")]
    pub config_version: Option<String>,

    /// Steps run first, in declared order
    #[serde(default)]
    pub setup: Vec<Step>,

    /// Main steps, in declared order
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Steps run last, in declared order
    #[serde(default)]
    pub post_build: Vec<Step>,

    /// Named groups of commands run concurrently between steps and post_build
    #[serde(default)]
    pub parallel: Vec<ParallelGroup>,

    /// Glob patterns excluded from watching and triggering
    #[serde(default)]
    pub ignore: Vec<String>,

    /// User-defined variables available to interpolation
    #[serde(default, rename = "vars")]
    pub variables: HashMap<String, String>,
}

/// A single named shell command with an optional gating condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name (shown in logs, exposed as $BUILD_STEP)
    pub name: String,

    /// Command template, interpolated per run
    pub command: String,

    /// Condition template; empty or absent means always run
    #[serde(default, rename = "if")]
    pub condition: Option<String>,
}

/// A named group of commands run concurrently
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelGroup {
    /// Group name (exposed as $BUILD_STEP for every command in the group)
    pub name: String,

    /// Commands launched together with no ordering among them
    pub commands: Vec<String>,
}

impl PipelineConfig {
    /// Load a pipeline from a YAML file, resolving `inherit` recursively and
    /// folding a sibling .gitignore into the ignore patterns.
    pub fn from_file(path: &Path) -> Result<Self, PipewatchError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PipewatchError::BuildFileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        let mut config: Self = serde_yaml::from_str(&content)?;

        if let Some(base) = config.inherit.clone() {
            let mut base_path = std::path::PathBuf::from(&base);
            if base_path.is_relative() {
                base_path = path.parent().unwrap_or(Path::new(".")).join(base_path);
            }

            let base_config =
                Self::from_file(&base_path).map_err(|e| PipewatchError::InheritError {
                    path: base_path.clone(),
                    error: e.to_string(),
                })?;

            config = merge_configs(base_config, config);
        }

        config.load_gitignore(path.parent().unwrap_or(Path::new(".")));

        Ok(config)
    }

    /// Parse a pipeline from a YAML string (no inheritance resolution).
    pub fn from_yaml(yaml: &str) -> Result<Self, PipewatchError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Whether `path` is excluded by the ignore patterns.
    ///
    /// Patterns use glob syntax including `**`; a pattern ending in `/` also
    /// matches everything beneath that directory.
    pub fn should_ignore(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");

        for pattern in &self.ignore {
            let pattern = pattern.replace('\\', "/");

            if let Ok(p) = glob::Pattern::new(&pattern) {
                if p.matches(&normalized) {
                    return true;
                }
            }

            // "dir/" means the directory itself and everything beneath it.
            if let Some(stripped) = pattern.strip_suffix('/') {
                if normalized == stripped {
                    return true;
                }
                if let Ok(p) = glob::Pattern::new(&format!("{pattern}**")) {
                    if p.matches(&normalized) {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// One-line phase summary for verbose output.
    pub fn summary(&self) -> String {
        format!(
            "{} setup, {} steps, {} parallel group(s), {} post_build",
            self.setup.len(),
            self.steps.len(),
            self.parallel.len(),
            self.post_build.len()
        )
    }

    /// Fold non-comment .gitignore lines from `dir` into the ignore list.
    fn load_gitignore(&mut self, dir: &Path) {
        let gitignore = dir.join(".gitignore");
        if !gitignore.exists() {
            return;
        }

        match std::fs::read_to_string(&gitignore) {
            Ok(content) => {
                for line in content.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    self.ignore.push(line.to_string());
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", gitignore.display(), e);
            }
        }
    }
}

/// Merge a base config under an overriding one.
///
/// Lists concatenate base-first; base variables only fill in missing keys.
fn merge_configs(base: PipelineConfig, mut override_cfg: PipelineConfig) -> PipelineConfig {
    for (k, v) in base.variables {
        override_cfg.variables.entry(k).or_insert(v);
    }

    fn prepend<T>(base: Vec<T>, own: Vec<T>) -> Vec<T> {
        let mut merged = base;
        merged.extend(own);
        merged
    }

    override_cfg.setup = prepend(base.setup, override_cfg.setup);
    override_cfg.steps = prepend(base.steps, override_cfg.steps);
    override_cfg.post_build = prepend(base.post_build, override_cfg.post_build);
    override_cfg.parallel = prepend(base.parallel, override_cfg.parallel);
    override_cfg.ignore = prepend(base.ignore, override_cfg.ignore);

    override_cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_pipeline() {
        let yaml = r#"
version: "1"
vars:
  TARGET: debug
steps:
  - name: compile
    command: cargo build
  - name: test
    command: cargo test
    if: $TARGET == debug
parallel:
  - name: lint
    commands:
      - cargo clippy
      - cargo fmt --check
post_build:
  - name: notify
    command: echo done
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.steps.len(), 2);
        assert_eq!(config.steps[0].name, "compile");
        assert_eq!(config.steps[1].condition.as_deref(), Some("$TARGET == debug"));
        assert_eq!(config.parallel.len(), 1);
        assert_eq!(config.parallel[0].commands.len(), 2);
        assert_eq!(config.post_build[0].name, "notify");
        assert_eq!(config.variables.get("TARGET").unwrap(), "debug");
    }

    #[test]
    fn test_summary_counts_phases() {
        let yaml = r#"
setup:
  - name: prep
    command: echo prep
steps:
  - name: a
    command: echo a
  - name: b
    command: echo b
parallel:
  - name: par
    commands: [echo p]
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.summary(), "1 setup, 2 steps, 1 parallel group(s), 0 post_build");
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let config = PipelineConfig::from_yaml("steps: []").unwrap();
        assert!(config.setup.is_empty());
        assert!(config.parallel.is_empty());
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn test_inherit_merges_base_first() {
        let dir = tempfile::tempdir().unwrap();

        let base = dir.path().join("base.yaml");
        std::fs::write(
            &base,
            "vars:\n  A: base\n  B: base\nsteps:\n  - name: base-step\n    command: echo base\n",
        )
        .unwrap();

        let child = dir.path().join("build.yaml");
        let mut f = std::fs::File::create(&child).unwrap();
        writeln!(f, "inherit: base.yaml").unwrap();
        writeln!(f, "vars:").unwrap();
        writeln!(f, "  B: child").unwrap();
        writeln!(f, "steps:").unwrap();
        writeln!(f, "  - name: child-step").unwrap();
        writeln!(f, "    command: echo child").unwrap();
        drop(f);

        let config = PipelineConfig::from_file(&child).unwrap();
        assert_eq!(config.steps.len(), 2);
        assert_eq!(config.steps[0].name, "base-step");
        assert_eq!(config.steps[1].name, "child-step");
        assert_eq!(config.variables.get("A").unwrap(), "base");
        assert_eq!(config.variables.get("B").unwrap(), "child");
    }

    #[test]
    fn test_gitignore_folded_into_ignore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target/\n# comment\n\n*.log\n").unwrap();
        std::fs::write(dir.path().join("build.yaml"), "steps: []\n").unwrap();

        let config = PipelineConfig::from_file(&dir.path().join("build.yaml")).unwrap();
        assert!(config.ignore.contains(&"target/".to_string()));
        assert!(config.ignore.contains(&"*.log".to_string()));
        assert!(!config.ignore.iter().any(|p| p.starts_with('#')));
    }

    #[test]
    fn test_should_ignore_globs() {
        let config = PipelineConfig {
            ignore: vec!["**/*.log".into(), "target/".into(), ".git".into()],
            ..Default::default()
        };

        assert!(config.should_ignore(Path::new("logs/app.log")));
        assert!(config.should_ignore(Path::new("target/debug/main")));
        assert!(config.should_ignore(Path::new(".git")));
        assert!(!config.should_ignore(Path::new("src/main.rs")));
    }

    #[test]
    fn test_missing_build_file_errors() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/build.yaml")).unwrap_err();
        assert!(matches!(err, PipewatchError::BuildFileReadError { .. }));
    }
}
