// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! CLI command definitions and handlers

pub mod run;
pub mod watch;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Local pipeline runner with watch mode
#[derive(Parser, Debug)]
#[clap(
    name = "pipewatch",
    version,
    about = "Run a declared shell pipeline, optionally re-triggering it on file changes",
    long_about = None,
    after_help = "Examples:\n\
        pipewatch run                   Run the pipeline once\n\
        pipewatch run -f ci.yaml        Run a specific build file\n\
        pipewatch watch                 Re-run the pipeline on file changes\n\n\
        See 'pipewatch <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline once
    Run {
        /// Build file
        #[clap(short, long, default_value = "build.yaml")]
        file: PathBuf,
    },

    /// Watch mode - re-run the pipeline on file changes
    Watch {
        /// Build file
        #[clap(short, long, default_value = "build.yaml")]
        file: PathBuf,

        /// Debounce delay in milliseconds
        #[clap(long, default_value = "1000")]
        debounce: u64,
    },
}
