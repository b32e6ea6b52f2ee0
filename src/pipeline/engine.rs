// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Pipeline engine
//!
//! Drives the four phases of a pipeline in order: setup, steps, parallel,
//! post_build. Sequential phases are fail-fast; the parallel phase fans out
//! one task per command and joins them all before post_build starts. Partial
//! side effects are not rolled back, so steps should be idempotent-enough
//! shell actions.

use std::time::{Duration, Instant};

use colored::Colorize;
use tokio::task::JoinSet;

use crate::errors::PipewatchError;
use crate::pipeline::{shell, PipelineConfig, Step};
use crate::vars::{self, RuntimeContext};

/// Outcome of a completed pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    /// Steps that actually executed
    pub steps_run: usize,
    /// Steps skipped because their condition was false
    pub steps_skipped: usize,
    /// Total wall time
    pub duration: Duration,
}

/// Pipeline engine
///
/// Stateless; one runtime context is built per call to [`PipelineEngine::run`].
pub struct PipelineEngine;

impl PipelineEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the whole pipeline once.
    ///
    /// `changed_file` and `event_type` are empty for manual runs. The first
    /// failing step aborts the run; later phases never start.
    pub async fn run(
        &self,
        config: &PipelineConfig,
        build_file: &str,
        changed_file: &str,
        event_type: &str,
    ) -> Result<PipelineReport, PipewatchError> {
        let start = Instant::now();

        println!("{}", "Starting pipeline...".bold());

        let ctx = RuntimeContext::build(
            config.variables.clone(),
            build_file,
            changed_file,
            event_type,
        );

        let mut report = PipelineReport {
            steps_run: 0,
            steps_skipped: 0,
            duration: Duration::ZERO,
        };

        self.run_steps(&config.setup, &ctx, &mut report).await?;
        self.run_steps(&config.steps, &ctx, &mut report).await?;
        self.run_parallel(config, &ctx, &mut report).await?;
        self.run_steps(&config.post_build, &ctx, &mut report).await?;

        report.duration = start.elapsed();

        println!(
            "{}",
            format!(
                "Pipeline completed successfully in {:.2}s",
                report.duration.as_secs_f64()
            )
            .green()
        );

        Ok(report)
    }

    /// Run one sequential phase in declared order, fail-fast.
    async fn run_steps(
        &self,
        steps: &[Step],
        ctx: &RuntimeContext,
        report: &mut PipelineReport,
    ) -> Result<(), PipewatchError> {
        for step in steps {
            let step_ctx = ctx.for_step(&step.name);

            let condition = step.condition.as_deref().unwrap_or("");
            if !vars::evaluate(condition, &step_ctx) {
                println!("  {} {} (condition not met)", "○".dimmed(), step.name.dimmed());
                report.steps_skipped += 1;
                continue;
            }

            println!("  {} {}", "→".blue(), step.name.bold());

            let command = vars::interpolate(&step.command, &step_ctx);
            match shell::run_command(&step.name, &command).await {
                Ok(()) => {
                    println!("  {} {}", "✓".green(), step.name.bold());
                    report.steps_run += 1;
                }
                Err(e) => {
                    println!("  {} {}", "✗".red(), step.name.bold());
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Launch every command of every parallel group and join them all.
    ///
    /// No ordering is guaranteed within or across groups. The first error
    /// aborts the run; sibling commands already launched may still finish.
    async fn run_parallel(
        &self,
        config: &PipelineConfig,
        ctx: &RuntimeContext,
        report: &mut PipelineReport,
    ) -> Result<(), PipewatchError> {
        if config.parallel.is_empty() {
            return Ok(());
        }

        let mut set: JoinSet<Result<(), PipewatchError>> = JoinSet::new();

        for group in &config.parallel {
            println!("  {} {} (parallel)", "→".blue(), group.name.bold());

            for command in &group.commands {
                let group_ctx = ctx.for_step(&group.name);
                let name = group.name.clone();
                let command = vars::interpolate(command, &group_ctx);

                set.spawn(async move { shell::run_command(&name, &command).await });
            }
        }

        while let Some(joined) = set.join_next().await {
            let result = joined.map_err(|e| PipewatchError::Io {
                message: format!("parallel task panicked: {e}"),
            })?;

            match result {
                Ok(()) => report.steps_run += 1,
                Err(e) => {
                    println!("  {} {}", "✗".red(), "parallel phase".bold());
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}
