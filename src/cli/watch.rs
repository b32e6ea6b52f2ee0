// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Watch command - re-run pipeline on file changes

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::PipewatchError;
use crate::pipeline::PipelineConfig;
use crate::watch::start_watching;

/// Watch the current directory and rerun the pipeline on changes.
///
/// Blocks until the watcher closes or a pipeline run fails; the failure
/// exits the process non-zero through main.
pub async fn run(file: PathBuf, debounce_ms: u64, verbose: bool) -> Result<()> {
    if !file.exists() {
        return Err(PipewatchError::BuildFileNotFound { path: file }.into());
    }

    let mut config = PipelineConfig::from_file(&file)?;

    if verbose {
        println!("{} {}", "Loaded:".dimmed(), config.summary());
    }

    // Never re-trigger on the build file itself.
    config.ignore.push(file.display().to_string());

    let root = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    let build_file = file.display().to_string();

    start_watching(root, config, build_file, Duration::from_millis(debounce_ms)).await?;

    Ok(())
}
