// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Run command - execute the pipeline once

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::errors::PipewatchError;
use crate::pipeline::{PipelineConfig, PipelineEngine};

/// Run the pipeline once with no triggering change.
pub async fn run(file: PathBuf, verbose: bool) -> Result<()> {
    if !file.exists() {
        return Err(PipewatchError::BuildFileNotFound { path: file }.into());
    }

    let config = PipelineConfig::from_file(&file)?;
    let build_file = file.display().to_string();

    if verbose {
        println!("{} {}", "Loaded:".dimmed(), config.summary());
    }

    let report = PipelineEngine::new()
        .run(&config, &build_file, "", "")
        .await?;

    if verbose && report.steps_skipped > 0 {
        println!(
            "{}",
            format!("{} step(s) skipped", report.steps_skipped).dimmed()
        );
    }

    Ok(())
}
